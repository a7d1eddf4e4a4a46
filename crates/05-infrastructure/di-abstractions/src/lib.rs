//! # Dependency Injection Abstractions
//!
//! 注入抽象层，定义绑定注册、依赖解析、注入点扫描和外部协作者的核心接口。
//!
//! ## 核心接口
//!
//! - [`BindingRegistry`] - 绑定注册表接口
//! - [`Container`] - 作用域容器接口
//! - [`TraversalFilter`] / [`Scan`] - 注入点扫描
//! - [`InjectionTarget`] / [`InjectionManifest`] - 编译期可见的注入清单
//! - [`ViewProvider`] / [`ResourceProvider`] / [`ExternalServiceProvider`] - 外部协作者
//! - [`DiagnosticsSink`] - 诊断事件出口

pub mod container;
pub mod diagnostics;
pub mod factory;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod target;

pub use container::*;
pub use diagnostics::*;
pub use factory::*;
pub use providers::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
pub use target::*;

/// 供 `injection-macros` 生成代码使用，不属于公开 API
#[doc(hidden)]
pub mod __private {
    pub use infrastructure_common as common;
    pub use once_cell::sync::Lazy;
}
