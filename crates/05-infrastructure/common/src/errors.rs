//! 错误类型定义
//!
//! 三类问题分开建模：
//! - [`ConfigurationError`] 绑定配置本身有问题，构建期致命，重试无意义；
//! - [`ResolutionError`] 单个请求键无法解析，按注入点汇总；
//! - [`InjectionError`] 一次注入调用的整体结果。
//!
//! 白名单不完整导致的扫描遗漏不是错误，只通过诊断事件可见。

use crate::key::{InjectionCategory, RequestKey};
use std::fmt;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("检测到循环绑定: {cycle}")]
    CyclicBinding { cycle: String },

    #[error("绑定类型不兼容: {key}, 实际实例类型 {actual}")]
    IncompatibleBinding { key: RequestKey, actual: String },

    #[error("扫描白名单无效: {message}")]
    InvalidAllowList { message: String },

    #[error("解析深度超过上限 {max_depth}: {chain}")]
    MaxDepthExceeded { max_depth: usize, chain: String },

    #[error("注入配置加载失败: {message}")]
    Settings { message: String },
}

impl ConfigurationError {
    /// 创建配置加载错误
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// 创建白名单错误
    pub fn invalid_allow_list(message: impl Into<String>) -> Self {
        Self::InvalidAllowList {
            message: message.into(),
        }
    }
}

/// 解析错误类型
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("无法解析 {key}: 没有绑定，外部提供者不识别，且类型不可默认构造")]
    NoBinding { key: RequestKey },

    #[error("无法解析 {key}: 未配置{provider}提供者")]
    ProviderUnavailable {
        key: RequestKey,
        provider: &'static str,
    },

    #[error("无法解析 {key}: 目标没有视图层级")]
    NoViewHierarchy { key: RequestKey },

    #[error("视图不存在: {key}, 视图层级: {root}")]
    ViewNotFound { key: RequestKey, root: String },

    #[error("资源不存在: {key}")]
    ResourceNotFound { key: RequestKey },

    #[error("外部服务不存在: {key}, 服务名: {service}")]
    ExternalServiceNotFound { key: RequestKey, service: String },

    #[error("实例生产失败: {key}, 原因: {message}")]
    ProductionFailed { key: RequestKey, message: String },

    #[error("实例类型不匹配: 请求 {key}, 实际 {actual}")]
    TypeMismatch { key: RequestKey, actual: String },

    #[error("解析 {key} 的依赖失败: {source}")]
    Dependency {
        key: RequestKey,
        #[source]
        source: Box<ResolutionError>,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl ResolutionError {
    /// 创建生产失败错误
    pub fn production_failed(key: &RequestKey, message: impl Into<String>) -> Self {
        Self::ProductionFailed {
            key: key.clone(),
            message: message.into(),
        }
    }

    /// 出错的请求键（配置错误没有单一的键）
    pub fn key(&self) -> Option<&RequestKey> {
        match self {
            Self::NoBinding { key }
            | Self::ProviderUnavailable { key, .. }
            | Self::NoViewHierarchy { key }
            | Self::ViewNotFound { key, .. }
            | Self::ResourceNotFound { key }
            | Self::ExternalServiceNotFound { key, .. }
            | Self::ProductionFailed { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::Dependency { key, .. } => Some(key),
            Self::Configuration(_) => None,
        }
    }

    /// 是否属于"提供者报告不存在"（可选注入点遇到时跳过）
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ViewNotFound { .. }
                | Self::ResourceNotFound { .. }
                | Self::ExternalServiceNotFound { .. }
                | Self::NoBinding { .. }
        )
    }
}

/// 单个注入点的解析失败
#[derive(Debug, Clone)]
pub struct ResolutionFailure {
    /// 触发解析的字段，形如 `MasterConsole::remote_control`
    pub site: String,
    /// 请求键
    pub key: RequestKey,
    /// 注入点类别
    pub category: InjectionCategory,
    /// 失败原因
    pub error: ResolutionError,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.site, self.category, self.key, self.error
        )
    }
}

/// 注入错误类型
#[derive(Error, Debug, Clone)]
pub enum InjectionError {
    #[error(
        "注入 {target} 失败，{} 个注入点无法解析: {}",
        .failures.len(),
        format_failures(.failures)
    )]
    Unresolved {
        target: String,
        failures: Vec<ResolutionFailure>,
    },

    #[error("目标已注入过: {target}")]
    AlreadyInjected { target: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl InjectionError {
    /// 所有失败的注入点
    pub fn failures(&self) -> &[ResolutionFailure] {
        match self {
            Self::Unresolved { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn format_failures(failures: &[ResolutionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 结果类型别名
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type ResolutionResult<T> = Result<T, ResolutionError>;
pub type InjectionResult<T> = Result<T, InjectionError>;
