//! 注入器
//!
//! 对目标的每个注入点求值并写入字段。所有注入点都会尝试解析，失败按注入点汇总；
//! 只要有一个失败，目标的字段一个都不写。

use crate::scanner::ManifestScanner;
use di_abstractions::{
    Container, DiagnosticEvent, DiagnosticsSink, InjectionPoint, InjectionScanner,
    InjectionTarget, ManifestEntry, NoopDiagnosticsSink, ViewRoot,
};
use infrastructure_common::{
    AnyInstance, InjectionCategory, InjectionError, ResolutionError, ResolutionFailure,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// 注入阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionPhase {
    /// 普通值与资源（目标创建后立即注入），不触发 `on_injected`
    Members,
    /// 视图（内容视图设置之后注入）
    Views,
    /// 全部
    #[default]
    All,
}

impl InjectionPhase {
    /// 该阶段是否包含此类别
    pub fn includes(self, category: InjectionCategory) -> bool {
        match self {
            Self::Members => category != InjectionCategory::View,
            Self::Views => category == InjectionCategory::View,
            Self::All => true,
        }
    }
}

/// 一次注入的结果
#[derive(Debug, Clone, Default)]
pub struct InjectionReport {
    /// 目标类型
    pub target: String,
    /// 写入的注入点数量
    pub injected: usize,
    /// 因提供者报告不存在而跳过的可选注入点
    pub skipped_optional: Vec<String>,
    /// 被受限扫描跳过的节数量
    pub omitted_sections: usize,
    /// 耗时
    pub elapsed: Duration,
}

/// 注入器
pub struct Injector {
    scanner: ManifestScanner,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Injector {
    /// 创建注入器
    pub fn new(scanner: ManifestScanner, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { scanner, sink }
    }

    /// 扫描器
    pub fn scanner(&self) -> &ManifestScanner {
        &self.scanner
    }

    /// 注入目标的所有注入点
    pub fn inject<T: InjectionTarget>(
        &self,
        target: &mut T,
        container: &dyn Container,
    ) -> Result<InjectionReport, InjectionError> {
        self.inject_phase(target, container, InjectionPhase::All)
    }

    /// 注入指定阶段的注入点
    pub fn inject_phase<T: InjectionTarget>(
        &self,
        target: &mut T,
        container: &dyn Container,
        phase: InjectionPhase,
    ) -> Result<InjectionReport, InjectionError> {
        let started = Instant::now();
        let target_name = T::manifest().target().to_string();
        let scan = self.scanner.scan(&*target);
        let omitted_sections = scan.omitted_sections().count();
        let view_root = target.view_root();

        let mut resolved: Vec<(&ManifestEntry<T>, AnyInstance)> = Vec::new();
        let mut skipped_optional = Vec::new();
        let mut failures = Vec::new();

        for entry in scan {
            let point = entry.point();
            if !phase.includes(point.category) {
                continue;
            }

            match Self::resolve_point(point, view_root.as_ref(), container)
                .and_then(|value| Self::check_field(entry, value))
            {
                Ok(value) => resolved.push((entry, value)),
                Err(error) if point.optional && error.is_not_found() => {
                    debug!("跳过可选注入点 {}: {}", point.site(), error);
                    skipped_optional.push(point.site());
                }
                Err(error) => failures.push(self.failure(&target_name, point, error)),
            }
        }

        if !failures.is_empty() {
            error!(
                "注入 {} 失败: {} 个注入点无法解析",
                target_name,
                failures.len()
            );
            return Err(InjectionError::Unresolved {
                target: target_name,
                failures,
            });
        }

        let injected = resolved.len();
        for (entry, value) in resolved {
            // 写入前已按字段类型校验过，这里的失败只可能来自 setter 自身
            entry.apply(target, value).map_err(|error| {
                let failure = self.failure(&target_name, entry.point(), error);
                InjectionError::Unresolved {
                    target: target_name.clone(),
                    failures: vec![failure],
                }
            })?;
        }
        if phase != InjectionPhase::Members {
            target.on_injected();
        }

        let elapsed = started.elapsed();
        debug!(
            "注入 {} 完成: {} 个注入点, 跳过 {} 个, 耗时 {:?}",
            target_name,
            injected,
            skipped_optional.len(),
            elapsed
        );
        self.sink.emit(&DiagnosticEvent::InjectionCompleted {
            target: target_name.clone(),
            injected,
            skipped: skipped_optional.len(),
            elapsed_micros: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        });

        Ok(InjectionReport {
            target: target_name,
            injected,
            skipped_optional,
            omitted_sections,
            elapsed,
        })
    }

    fn resolve_point(
        point: &InjectionPoint,
        view_root: Option<&ViewRoot>,
        container: &dyn Container,
    ) -> Result<AnyInstance, ResolutionError> {
        let key = &point.key;
        let value = match point.category {
            InjectionCategory::Value => container.resolve(key)?,
            InjectionCategory::View => {
                let provider =
                    container
                        .view_provider()
                        .ok_or_else(|| ResolutionError::ProviderUnavailable {
                            key: key.clone(),
                            provider: "视图",
                        })?;
                let root = view_root.ok_or_else(|| ResolutionError::NoViewHierarchy {
                    key: key.clone(),
                })?;
                provider
                    .find_view(root, key)
                    .ok_or_else(|| ResolutionError::ViewNotFound {
                        key: key.clone(),
                        root: root.to_string(),
                    })?
            }
            InjectionCategory::Resource => {
                let provider = container.resource_provider().ok_or_else(|| {
                    ResolutionError::ProviderUnavailable {
                        key: key.clone(),
                        provider: "资源",
                    }
                })?;
                provider
                    .lookup(key)
                    .ok_or_else(|| ResolutionError::ResourceNotFound { key: key.clone() })?
            }
        };

        if key.type_info().matches(&value) {
            Ok(value)
        } else {
            Err(ResolutionError::TypeMismatch {
                key: key.clone(),
                actual: format!("{:?}", (*value).type_id()),
            })
        }
    }

    /// 值必须能写入字段槽位，手写清单的请求键类型可能与字段不一致
    fn check_field<T>(
        entry: &ManifestEntry<T>,
        value: AnyInstance,
    ) -> Result<AnyInstance, ResolutionError> {
        if entry.accepts(&value) {
            Ok(value)
        } else {
            Err(ResolutionError::TypeMismatch {
                key: entry.point().key.clone(),
                actual: format!("字段类型 {}", entry.field_type()),
            })
        }
    }

    fn failure(
        &self,
        target: &str,
        point: &InjectionPoint,
        error: ResolutionError,
    ) -> ResolutionFailure {
        let site = point.site();
        self.sink.emit(&DiagnosticEvent::InjectionFailed {
            target: target.to_string(),
            site: site.clone(),
            key: point.key.to_string(),
            reason: error.to_string(),
        });
        ResolutionFailure {
            site,
            key: point.key.clone(),
            category: point.category,
            error,
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new(ManifestScanner::unrestricted(), Arc::new(NoopDiagnosticsSink))
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("scanner", &self.scanner)
            .finish_non_exhaustive()
    }
}
