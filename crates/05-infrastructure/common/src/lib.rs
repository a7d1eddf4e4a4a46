//! # Infrastructure Common
//!
//! 这个 crate 提供了注入引擎各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 类型标识（可携带零参构造器）
//! - [`RequestKey`] - 注入请求键（类型 + 可选限定符）
//! - [`ScopePolicy`] / [`Scope`] - 作用域策略与作用域标识
//! - [`InjectionState`] - 注入目标的生命周期状态
//! - [`ConfigurationError`] / [`ResolutionError`] / [`InjectionError`] - 错误分类
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全，不做运行时反射
//! - 错误显式返回，不吞异常

pub mod errors;
pub mod key;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use key::*;
pub use lifecycle::*;
pub use metadata::*;

/// 注入值的统一表示
///
/// 所有由容器或外部提供者产生的值都以此形式传递，写入字段时再向下转型。
pub type AnyInstance = std::sync::Arc<dyn std::any::Any + Send + Sync>;
