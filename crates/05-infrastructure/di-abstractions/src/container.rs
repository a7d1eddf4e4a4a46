//! 作用域容器抽象接口
//!
//! 容器持有（只读的）绑定注册表和一个作用域，按请求键生产或复用实例。

use crate::providers::{ResourceProvider, ViewProvider};
use crate::resolver::DEFAULT_MAX_RESOLUTION_DEPTH;
use infrastructure_common::{AnyInstance, RequestKey, ResolutionError, Scope};
use std::sync::Arc;

/// 作用域容器 trait
///
/// 对象安全，注入器以 `&dyn Container` 使用它。
/// 可以被多个线程同时调用；单例在同一作用域内最多生产一次。
pub trait Container: Send + Sync {
    /// 容器作用域
    fn scope(&self) -> &Scope;

    /// 解析请求键
    ///
    /// 有绑定时按绑定的策略与作用域生产；没有绑定时依次尝试
    /// 识别该键的外部服务提供者和类型的默认构造器。
    fn resolve(&self, key: &RequestKey) -> Result<AnyInstance, ResolutionError>;

    /// 是否存在显式绑定
    fn is_bound(&self, key: &RequestKey) -> bool;

    /// 视图提供者
    fn view_provider(&self) -> Option<&dyn ViewProvider>;

    /// 资源提供者
    fn resource_provider(&self) -> Option<&dyn ResourceProvider>;

    /// 统计信息快照
    fn stats(&self) -> ContainerStats;
}

/// 容器的泛型便捷方法
pub trait ContainerExt: Container {
    /// 解析并向下转型
    fn resolve_key_as<T>(&self, key: &RequestKey) -> Result<Arc<T>, ResolutionError>
    where
        T: Send + Sync + 'static,
    {
        let instance = self.resolve(key)?;
        instance
            .downcast::<T>()
            .map_err(|other| ResolutionError::TypeMismatch {
                key: key.clone(),
                actual: format!("{:?}", (*other).type_id()),
            })
    }

    /// 按类型解析
    fn resolve_as<T>(&self) -> Result<Arc<T>, ResolutionError>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_key_as(&RequestKey::of::<T>())
    }

    /// 按类型和名称解析
    fn resolve_named<T>(&self, name: &str) -> Result<Arc<T>, ResolutionError>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_key_as(&RequestKey::named::<T>(name))
    }

    /// 按类型解析，没有绑定时允许默认构造
    fn resolve_default<T>(&self) -> Result<Arc<T>, ResolutionError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.resolve_key_as(&RequestKey::constructible::<T>())
    }
}

impl<C: Container + ?Sized> ContainerExt for C {}

/// 容器配置
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// 构建时是否检测循环绑定（运行期的重入检测始终开启）
    pub detect_cycles: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 解析调用次数（含嵌套依赖）
    pub resolutions: u64,
    /// 实际生产的实例数量
    pub productions: u64,
    /// 单例缓存命中次数
    pub singleton_hits: u64,
    /// 通过隐式策略解析的次数
    pub implicit_resolutions: u64,
    /// 解析失败次数
    pub failures: u64,
}
