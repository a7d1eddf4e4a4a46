//! 诊断出口实现

use di_abstractions::{DiagnosticEvent, DiagnosticLevel, DiagnosticsSink};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

/// 通过 `tracing` 记录诊断事件
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnosticsSink;

impl DiagnosticsSink for TracingDiagnosticsSink {
    fn emit(&self, event: &DiagnosticEvent) {
        let name = event.name();
        match event {
            DiagnosticEvent::AllowListEmpty => {
                warn!(event = name, "扫描白名单为空, 回退到完整扫描");
            }
            DiagnosticEvent::ScanOmission {
                target,
                class,
                points,
            } => {
                debug!(event = name, %target, %class, points, "受限扫描跳过了声明注入点的类型");
            }
            DiagnosticEvent::BindingOverridden { key, strategy } => {
                debug!(event = name, %key, %strategy, "绑定被覆盖");
            }
            DiagnosticEvent::ImplicitResolution { key, strategy } => {
                debug!(event = name, %key, %strategy, "隐式解析");
            }
            DiagnosticEvent::InjectionFailed {
                target,
                site,
                key,
                reason,
            } => {
                error!(event = name, %target, %site, %key, %reason, "注入点解析失败");
            }
            DiagnosticEvent::InjectionCompleted {
                target,
                injected,
                skipped,
                elapsed_micros,
            } => {
                info!(
                    event = name,
                    %target,
                    injected,
                    skipped,
                    elapsed_micros,
                    "注入完成"
                );
            }
        }
    }
}

/// 收集诊断事件，供测试或宿主检查
#[derive(Debug, Default)]
pub struct CollectingDiagnosticsSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingDiagnosticsSink {
    /// 创建收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集的事件
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// 不低于指定级别的事件
    pub fn events_at_least(&self, level: DiagnosticLevel) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level() >= level)
            .cloned()
            .collect()
    }

    /// 清空
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticsSink for CollectingDiagnosticsSink {
    fn emit(&self, event: &DiagnosticEvent) {
        self.events.lock().push(event.clone());
    }
}
