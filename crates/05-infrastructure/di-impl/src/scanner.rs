//! 注入点扫描器实现

use di_abstractions::{
    AllowList, AllowListFilter, DiagnosticEvent, DiagnosticsSink, InjectionManifest,
    InjectionScanner, InjectionTarget, NoopDiagnosticsSink, Scan, ScanMode, TraversalFilter,
    UnrestrictedFilter,
};
use infrastructure_common::ConfigurationError;
use std::sync::Arc;
use tracing::{debug, warn};

/// 基于注入清单的扫描器
///
/// 白名单在构造时确定：未配置或配置为空时完整遍历，否则只遍历名单内的类型。
pub struct ManifestScanner {
    filter: Box<dyn TraversalFilter>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl ManifestScanner {
    /// 创建扫描器
    pub fn new(allow_list: Option<AllowList>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        let filter: Box<dyn TraversalFilter> = match allow_list {
            Some(allow_list) if !allow_list.is_empty() => {
                debug!("受限扫描, 白名单 {} 项", allow_list.len());
                Box::new(AllowListFilter::new(allow_list))
            }
            Some(_) => {
                warn!("扫描白名单为空, 回退到完整扫描");
                sink.emit(&DiagnosticEvent::AllowListEmpty);
                Box::new(UnrestrictedFilter)
            }
            None => Box::new(UnrestrictedFilter),
        };

        Self { filter, sink }
    }

    /// 完整扫描
    pub fn unrestricted() -> Self {
        Self::new(None, Arc::new(NoopDiagnosticsSink))
    }

    /// 从配置的类型名称创建扫描器
    ///
    /// `restricted` 为 `false` 时忽略名单；名单中有空白名称时返回配置错误。
    pub fn from_names<S: AsRef<str>>(
        restricted: bool,
        names: &[S],
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ConfigurationError> {
        let allow_list = if restricted {
            Some(AllowList::from_names(names)?)
        } else {
            None
        };
        Ok(Self::new(allow_list, sink))
    }

    /// 扫描模式
    pub fn mode(&self) -> ScanMode {
        self.filter.mode()
    }

    /// 按类型扫描（不需要目标实例）
    pub fn scan_type<T: InjectionTarget>(&self) -> Scan<'_, T> {
        self.scan_manifest(T::manifest())
    }

    fn scan_manifest<'a, T>(&'a self, manifest: &'a InjectionManifest<T>) -> Scan<'a, T> {
        let scan = Scan::new(manifest, self.filter.as_ref());

        for section in scan.omitted_sections() {
            let points = section.entries().len();
            debug!(
                "跳过 {} 的 {} 个注入点 (声明类型 {} 不在白名单内)",
                manifest.target(),
                points,
                section.declaring_type()
            );
            self.sink.emit(&DiagnosticEvent::ScanOmission {
                target: manifest.target().to_string(),
                class: section.declaring_type().to_string(),
                points,
            });
        }

        scan
    }
}

impl InjectionScanner for ManifestScanner {
    fn filter(&self) -> &dyn TraversalFilter {
        self.filter.as_ref()
    }

    fn scan<'a, T: InjectionTarget>(&'a self, _target: &T) -> Scan<'a, T> {
        self.scan_type::<T>()
    }
}

impl Default for ManifestScanner {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl std::fmt::Debug for ManifestScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestScanner")
            .field("mode", &self.filter.mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticsSink;
    use di_abstractions::{InjectionManifest, InjectionPoint, Injected};
    use infrastructure_common::RequestKey;
    use once_cell::sync::Lazy;

    #[derive(Default)]
    struct ScreenBase {
        title: Injected<String>,
    }

    impl InjectionTarget for ScreenBase {
        fn manifest() -> &'static InjectionManifest<Self> {
            static MANIFEST: Lazy<InjectionManifest<ScreenBase>> = Lazy::new(|| {
                InjectionManifest::builder()
                    .resource::<String, _>(
                        "title",
                        RequestKey::with_type_id::<String>(1),
                        |target: &mut ScreenBase, value| target.title.set(value),
                    )
                    .build()
            });
            &MANIFEST
        }
    }

    #[derive(Default)]
    struct Screen {
        base: ScreenBase,
        counter: Injected<u32>,
    }

    impl InjectionTarget for Screen {
        fn manifest() -> &'static InjectionManifest<Self> {
            static MANIFEST: Lazy<InjectionManifest<Screen>> = Lazy::new(|| {
                InjectionManifest::builder()
                    .value::<u32, _>(
                        "counter",
                        RequestKey::of::<u32>(),
                        |target: &mut Screen, value| target.counter.set(value),
                    )
                    .embed(|target: &mut Screen| &mut target.base)
                    .build()
            });
            &MANIFEST
        }
    }

    fn sites<'a>(scan: Scan<'a, Screen>) -> Vec<String> {
        scan.map(|entry| entry.point().site()).collect()
    }

    #[test]
    fn test_empty_allow_list_falls_back() {
        let sink = Arc::new(CollectingDiagnosticsSink::new());
        let scanner = ManifestScanner::new(Some(AllowList::new()), sink.clone());

        assert_eq!(scanner.mode(), ScanMode::Unrestricted);
        assert_eq!(sink.events(), vec![DiagnosticEvent::AllowListEmpty]);
        assert_eq!(sites(scanner.scan(&Screen::default())).len(), 2);
    }

    #[test]
    fn test_restricted_scan_reports_omission() {
        let sink = Arc::new(CollectingDiagnosticsSink::new());
        let scanner = ManifestScanner::new(Some(AllowList::new().with::<Screen>()), sink.clone());

        assert_eq!(sites(scanner.scan_type::<Screen>()), vec!["Screen::counter"]);
        assert_eq!(
            sink.events(),
            vec![DiagnosticEvent::ScanOmission {
                target: "Screen".to_string(),
                class: "ScreenBase".to_string(),
                points: 1,
            }]
        );
    }

    #[test]
    fn test_complete_allow_list_matches_unrestricted() {
        let restricted = ManifestScanner::from_names(
            true,
            &["Screen", "ScreenBase"],
            Arc::new(NoopDiagnosticsSink),
        )
        .unwrap();
        let unrestricted = ManifestScanner::unrestricted();

        let expected: Vec<InjectionPoint> = unrestricted
            .scan_type::<Screen>()
            .map(|entry| entry.point().clone())
            .collect();
        let actual: Vec<InjectionPoint> = restricted
            .scan_type::<Screen>()
            .map(|entry| entry.point().clone())
            .collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_blank_allow_list_name_rejected() {
        let result = ManifestScanner::from_names(true, &["Screen", ""], Arc::new(NoopDiagnosticsSink));
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidAllowList { .. })
        ));

        // 未启用受限扫描时名单被忽略
        assert!(ManifestScanner::from_names(false, &[""], Arc::new(NoopDiagnosticsSink)).is_ok());
    }
}
