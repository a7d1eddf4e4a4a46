//! 作用域与注入生命周期

use serde::{Deserialize, Serialize};

/// 绑定的作用域策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScopePolicy {
    /// 单例 - 同一作用域内只生产一次，之后复用缓存
    Singleton,
    /// 每次请求都重新生产
    #[default]
    PerRequest,
}

/// 容器作用域
///
/// 单例缓存以作用域为边界（例如每个运行中的界面实例一个作用域）。
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Scope {
    /// 创建新作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建根作用域
    pub fn root() -> Self {
        Self::new("root")
    }

    /// 创建子作用域
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }
}

/// 注入目标的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InjectionState {
    /// 已创建，尚未注入
    #[default]
    Uninjected,
    /// 注入中
    Injecting,
    /// 注入完成，可以使用
    Ready,
    /// 注入失败，不可使用
    Failed,
}

impl InjectionState {
    /// 是否可以开始注入
    pub fn can_inject(self) -> bool {
        matches!(self, Self::Uninjected)
    }

    /// 是否可以使用
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_scope_name() {
        let root = Scope::root();
        let child = root.child("MasterConsole");
        assert_eq!(child.name, "root.MasterConsole");
        assert_ne!(root.id, child.id);
    }

    #[test]
    fn test_injection_state_transitions() {
        assert!(InjectionState::default().can_inject());
        assert!(!InjectionState::Failed.can_inject());
        assert!(InjectionState::Ready.is_ready());
        assert_eq!(ScopePolicy::default(), ScopePolicy::PerRequest);
    }

    #[test]
    fn test_scope_policy_serde() {
        let json = serde_json::to_string(&ScopePolicy::Singleton).unwrap();
        assert_eq!(json, "\"Singleton\"");
        let policy: ScopePolicy = serde_json::from_str("\"PerRequest\"").unwrap();
        assert_eq!(policy, ScopePolicy::PerRequest);
    }
}
