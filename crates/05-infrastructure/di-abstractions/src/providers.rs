//! 外部协作者接口
//!
//! 视图渲染、资源解析、系统服务都不属于注入机制本身，
//! 机制只通过这里的窄接口调用它们。提供者可能阻塞，机制不做超时与取消。

use infrastructure_common::{AnyInstance, RequestKey};
use std::fmt;

/// 视图层级根
///
/// 宿主目标当前内容视图的句柄，视图查找限定在该层级内。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewRoot(String);

impl ViewRoot {
    /// 创建视图层级根
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 层级名称
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 视图提供者
pub trait ViewProvider: Send + Sync {
    /// 在视图层级中按 id 或 tag（请求键的限定符）查找视图，找不到返回 `None`
    fn find_view(&self, root: &ViewRoot, key: &RequestKey) -> Option<AnyInstance>;
}

/// 资源 / extra 提供者
pub trait ResourceProvider: Send + Sync {
    /// 按资源 id 或 extra 名称（请求键的限定符）查找期望类型的值，找不到返回 `None`
    fn lookup(&self, key: &RequestKey) -> Option<AnyInstance>;
}

/// 外部服务提供者
///
/// 对应"从命名的外部服务获取"这一类策略，例如系统服务。
pub trait ExternalServiceProvider: Send + Sync {
    /// 提供者名称
    fn name(&self) -> &str;

    /// 是否识别该请求键，识别时返回对应的服务名称
    fn recognizes(&self, key: &RequestKey) -> Option<String>;

    /// 获取服务实例，不存在返回 `None`
    fn fetch(&self, service: &str, key: &RequestKey) -> Option<AnyInstance>;
}
