//! 注入引擎的集成测试
//!
//! 用手写清单模拟一个遥控台界面：普通对象、系统服务、视图和嵌入的基础结构体。

use di_abstractions::{
    AllowList, BindingRegistry, Container, ContainerExt, DiagnosticLevel, Factory, Injected,
    InjectionManifest, InjectionTarget, ProductionStrategy, ViewProvider, ViewRoot,
};
use di_impl::{
    BindingRegistryImpl, CollectingDiagnosticsSink, Injector, ManifestScanner, ScopedContainer,
    StaticServiceProvider,
};
use infrastructure_common::{
    AnyInstance, ConfigurationError, InjectionError, Qualifier, RequestKey, ResolutionError,
    ScopePolicy,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct RemoteControl;

#[derive(Debug)]
struct Vibrator {
    device: &'static str,
}

#[derive(Debug)]
struct ClickHandler(&'static str);

#[derive(Debug, PartialEq)]
struct Label(String);

#[derive(Default)]
struct ScreenBase {
    title: Injected<Label>,
    activations: usize,
}

impl InjectionTarget for ScreenBase {
    fn manifest() -> &'static InjectionManifest<Self> {
        static MANIFEST: Lazy<InjectionManifest<ScreenBase>> = Lazy::new(|| {
            InjectionManifest::builder()
                .value("title", RequestKey::named::<Label>("title"), |target: &mut ScreenBase, value| {
                    target.title.set(value);
                })
                .build()
        });
        &MANIFEST
    }
}

#[derive(Default)]
struct MasterConsole {
    remote_control: Injected<RemoteControl>,
    vibrator: Injected<Vibrator>,
    say_hello: Injected<ClickHandler>,
    fight_evil: Injected<ClickHandler>,
    base: ScreenBase,
    content: Option<ViewRoot>,
}

impl MasterConsole {
    fn with_content(name: &str) -> Self {
        Self {
            content: Some(ViewRoot::new(name)),
            ..Self::default()
        }
    }
}

impl InjectionTarget for MasterConsole {
    fn manifest() -> &'static InjectionManifest<Self> {
        static MANIFEST: Lazy<InjectionManifest<MasterConsole>> = Lazy::new(|| {
            InjectionManifest::builder()
                .value(
                    "remote_control",
                    RequestKey::constructible::<RemoteControl>(),
                    |target: &mut MasterConsole, value| target.remote_control.set(value),
                )
                .value(
                    "vibrator",
                    RequestKey::of::<Vibrator>(),
                    |target: &mut MasterConsole, value| target.vibrator.set(value),
                )
                .view(
                    "say_hello",
                    RequestKey::named::<ClickHandler>("sayhello"),
                    |target: &mut MasterConsole, value| target.say_hello.set(value),
                )
                .view(
                    "fight_evil",
                    RequestKey::named::<ClickHandler>("fightevil"),
                    |target: &mut MasterConsole, value| target.fight_evil.set(value),
                )
                .embed(|target: &mut MasterConsole| &mut target.base)
                .build()
        });
        &MANIFEST
    }

    fn view_root(&self) -> Option<ViewRoot> {
        self.content.clone()
    }

    fn on_injected(&mut self) {
        self.base.activations += 1;
    }
}

/// 按 (根, 标签) 查找的视图层级
#[derive(Default)]
struct ViewTree {
    views: HashMap<(String, String), AnyInstance>,
}

impl ViewTree {
    fn with(mut self, root: &str, tag: &str, handler: &'static str) -> Self {
        self.views.insert(
            (root.to_string(), tag.to_string()),
            Arc::new(ClickHandler(handler)),
        );
        self
    }
}

impl ViewProvider for ViewTree {
    fn find_view(&self, root: &ViewRoot, key: &RequestKey) -> Option<AnyInstance> {
        let Some(Qualifier::Name(tag)) = key.qualifier() else {
            return None;
        };
        self.views.get(&(root.name().to_string(), tag.clone())).cloned()
    }
}

fn console_views() -> ViewTree {
    ViewTree::default()
        .with("console", "sayhello", "打招呼")
        .with("console", "fightevil", "打击邪恶")
        .with("hello", "sayhello", "打招呼")
}

fn system_services() -> StaticServiceProvider {
    StaticServiceProvider::new("system").with_service(
        "vibrator",
        Vibrator {
            device: "vibrator-0",
        },
    )
}

fn console_container(sink: Arc<CollectingDiagnosticsSink>) -> ScopedContainer {
    ScopedContainer::builder()
        .configure(|registry| {
            registry.bind_instance(
                RequestKey::named::<Label>("title"),
                Label("阿童木遥控台".to_string()),
            );
        })
        .with_service_provider(Arc::new(system_services()))
        .with_view_provider(Arc::new(console_views()))
        .with_diagnostics(sink)
        .build()
        .unwrap()
}

#[test]
fn test_console_fully_injected() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let container = console_container(sink.clone());
    let injector = Injector::new(ManifestScanner::unrestricted(), sink.clone());
    let mut console = MasterConsole::with_content("console");

    let report = injector.inject(&mut console, &container).unwrap();

    assert_eq!(report.injected, 5);
    assert_eq!(console.vibrator.device, "vibrator-0");
    assert_eq!(console.fight_evil.0, "打击邪恶");
    assert_eq!(*console.base.title, Label("阿童木遥控台".to_string()));
    assert!(console.remote_control.is_injected());
    assert_eq!(console.base.activations, 1);
    assert!(sink.events_at_least(DiagnosticLevel::Warn).is_empty());
}

#[test]
fn test_vibrator_comes_from_external_provider() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let container = console_container(sink.clone());

    let first = container.resolve_as::<Vibrator>().unwrap();
    let second = container.resolve_as::<Vibrator>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!container.is_bound(&RequestKey::of::<Vibrator>()));
    assert_eq!(container.stats().implicit_resolutions, 2);
    assert!(sink
        .events()
        .iter()
        .any(|event| event.name() == "implicit_resolution"));
}

#[test]
fn test_missing_fightevil_view_fails_injection() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let container = console_container(sink.clone());
    let injector = Injector::new(ManifestScanner::unrestricted(), sink.clone());
    let mut console = MasterConsole::with_content("hello");

    let error = injector.inject(&mut console, &container).unwrap_err();

    let failures = error.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].site.ends_with("MasterConsole::fight_evil"));
    match &failures[0].error {
        ResolutionError::ViewNotFound { key, root } => {
            assert_eq!(key.name(), Some("fightevil"));
            assert_eq!(root, "hello");
        }
        other => panic!("意外的错误: {other}"),
    }
    assert!(!console.say_hello.is_injected());
    assert!(!console.vibrator.is_injected());
    assert_eq!(console.base.activations, 0);
    assert_eq!(sink.events_at_least(DiagnosticLevel::Error).len(), 1);
}

#[test]
fn test_every_failure_is_reported() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    // 没有外部服务、视图提供者和标题绑定
    let container = ScopedContainer::builder()
        .with_diagnostics(sink.clone())
        .build()
        .unwrap();
    let injector = Injector::new(ManifestScanner::unrestricted(), sink.clone());
    let mut console = MasterConsole::with_content("console");

    let InjectionError::Unresolved { target, failures } =
        injector.inject(&mut console, &container).unwrap_err()
    else {
        panic!("应当是 Unresolved");
    };

    assert!(target.ends_with("MasterConsole"));
    let sites: Vec<_> = failures
        .iter()
        .map(|failure| failure.site.rsplit("::").next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(sites, vec!["vibrator", "say_hello", "fight_evil", "title"]);
    assert!(matches!(
        failures[0].error,
        ResolutionError::NoBinding { .. }
    ));
    assert!(matches!(
        failures[1].error,
        ResolutionError::ProviderUnavailable { .. }
    ));
    assert_eq!(
        sink.events()
            .iter()
            .filter(|event| event.name() == "injection_failed")
            .count(),
        4
    );
    assert!(!console.remote_control.is_injected());
}

#[test]
fn test_complete_allow_list_matches_unrestricted_scan() {
    let complete = ManifestScanner::new(
        Some(AllowList::new().with::<MasterConsole>().with::<ScreenBase>()),
        Arc::new(CollectingDiagnosticsSink::new()),
    );
    let unrestricted = ManifestScanner::unrestricted();

    let restricted_sites: Vec<_> = complete
        .scan_type::<MasterConsole>()
        .map(|entry| entry.point().site())
        .collect();
    let unrestricted_sites: Vec<_> = unrestricted
        .scan_type::<MasterConsole>()
        .map(|entry| entry.point().site())
        .collect();
    assert_eq!(restricted_sites, unrestricted_sites);

    let injector = Injector::new(complete, Arc::new(CollectingDiagnosticsSink::new()));
    let container = console_container(Arc::new(CollectingDiagnosticsSink::new()));
    let mut console = MasterConsole::with_content("console");
    let report = injector.inject(&mut console, &container).unwrap();
    assert_eq!(report.omitted_sections, 0);
    assert!(console.base.title.is_injected());
}

#[test]
fn test_incomplete_allow_list_reports_omission() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let scanner = ManifestScanner::from_names(true, &["MasterConsole"], sink.clone()).unwrap();
    let injector = Injector::new(scanner, sink.clone());
    let container = console_container(Arc::new(CollectingDiagnosticsSink::new()));
    let mut console = MasterConsole::with_content("console");

    let report = injector.inject(&mut console, &container).unwrap();

    assert_eq!(report.omitted_sections, 1);
    assert!(!console.base.title.is_injected());
    let omissions: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|event| event.name() == "scan_omission")
        .collect();
    assert_eq!(omissions.len(), 1);
    assert_eq!(omissions[0].level(), DiagnosticLevel::Debug);
    assert!(sink.events_at_least(DiagnosticLevel::Warn).is_empty());
}

#[test]
fn test_empty_allow_list_falls_back_to_unrestricted() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let scanner = ManifestScanner::new(Some(AllowList::new()), sink.clone());

    assert_eq!(scanner.mode(), ManifestScanner::unrestricted().mode());
    assert_eq!(scanner.scan_type::<MasterConsole>().count(), 5);
    assert_eq!(sink.events()[0].name(), "allow_list_empty");
}

#[test]
fn test_last_registration_wins() {
    let mut registry = BindingRegistryImpl::new();
    registry.bind_instance(RequestKey::named::<Label>("title"), Label("旧标题".to_string()));
    registry.bind_instance(RequestKey::named::<Label>("title"), Label("新标题".to_string()));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.override_count(), 1);

    let container = ScopedContainer::builder()
        .with_registry(registry)
        .build()
        .unwrap();
    let label = container.resolve_named::<Label>("title").unwrap();
    assert_eq!(label.0, "新标题");
}

#[test]
fn test_module_override_replaces_external_service() {
    let container = ScopedContainer::builder()
        .configure(|registry| {
            registry.bind_service(RequestKey::of::<Vibrator>(), "vibrator");
            registry.register(
                RequestKey::of::<Vibrator>(),
                ProductionStrategy::instance(Vibrator { device: "fake" }),
                ScopePolicy::Singleton,
            );
        })
        .with_service_provider(Arc::new(system_services()))
        .build()
        .unwrap();

    assert_eq!(container.resolve_as::<Vibrator>().unwrap().device, "fake");
}

#[test]
fn test_cycle_rejected_at_build() {
    struct Alpha;
    struct Beta;

    let result = ScopedContainer::builder()
        .configure(|registry| {
            registry.bind_factory(
                RequestKey::of::<Alpha>(),
                Factory::with_dependency::<Beta, _, _>(RequestKey::of::<Beta>(), |_| Alpha),
                ScopePolicy::Singleton,
            );
            registry.bind_factory(
                RequestKey::of::<Beta>(),
                Factory::with_dependency::<Alpha, _, _>(RequestKey::of::<Alpha>(), |_| Beta),
                ScopePolicy::PerRequest,
            );
        })
        .build();

    match result {
        Err(ConfigurationError::CyclicBinding { cycle }) => {
            assert!(cycle.contains("Alpha"));
            assert!(cycle.contains("Beta"));
        }
        other => panic!("应当检测到循环绑定: {other:?}"),
    }
}

#[test]
fn test_failed_singleton_is_retried() -> anyhow::Result<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let container = ScopedContainer::builder()
        .configure(move |registry| {
            registry.bind_factory(
                RequestKey::of::<Label>(),
                Factory::try_from_fn(move || {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("设备未就绪".into())
                    } else {
                        Ok(Label("就绪".to_string()))
                    }
                }),
                ScopePolicy::Singleton,
            );
        })
        .build()?;

    assert!(container.resolve_as::<Label>().is_err());
    let label = container.resolve_as::<Label>()?;
    assert_eq!(label.0, "就绪");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}
