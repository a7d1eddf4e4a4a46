//! 诊断事件
//!
//! 注入机制对外发出的结构化事件，宿主决定是否记录。
//! 扫描遗漏（白名单不完整）只能通过这里观察到。

use serde::Serialize;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// 诊断事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// 配置了空白名单，回退到完整扫描
    AllowListEmpty,
    /// 受限扫描跳过了声明注入点的类型
    ScanOmission {
        target: String,
        class: String,
        points: usize,
    },
    /// 绑定被覆盖
    BindingOverridden { key: String, strategy: String },
    /// 未注册的请求键通过隐式策略解析
    ImplicitResolution { key: String, strategy: String },
    /// 单个注入点解析失败
    InjectionFailed {
        target: String,
        site: String,
        key: String,
        reason: String,
    },
    /// 目标注入完成
    InjectionCompleted {
        target: String,
        injected: usize,
        skipped: usize,
        elapsed_micros: u64,
    },
}

impl DiagnosticEvent {
    /// 事件级别
    pub fn level(&self) -> DiagnosticLevel {
        match self {
            Self::AllowListEmpty => DiagnosticLevel::Warn,
            Self::InjectionFailed { .. } => DiagnosticLevel::Error,
            Self::InjectionCompleted { .. } => DiagnosticLevel::Info,
            Self::ScanOmission { .. }
            | Self::BindingOverridden { .. }
            | Self::ImplicitResolution { .. } => DiagnosticLevel::Debug,
        }
    }

    /// 事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllowListEmpty => "allow_list_empty",
            Self::ScanOmission { .. } => "scan_omission",
            Self::BindingOverridden { .. } => "binding_overridden",
            Self::ImplicitResolution { .. } => "implicit_resolution",
            Self::InjectionFailed { .. } => "injection_failed",
            Self::InjectionCompleted { .. } => "injection_completed",
        }
    }
}

/// 诊断事件出口
pub trait DiagnosticsSink: Send + Sync {
    /// 发出事件
    fn emit(&self, event: &DiagnosticEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnosticsSink;

impl DiagnosticsSink for NoopDiagnosticsSink {
    fn emit(&self, _event: &DiagnosticEvent) {}
}
