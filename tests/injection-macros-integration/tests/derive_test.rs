//! `#[derive(Injectable)]` 端到端测试

use di_abstractions::{Container, Injected, InjectionTarget, ViewProvider, ViewRoot};
use di_impl::{
    CollectingDiagnosticsSink, Injector, ManifestScanner, ScopedContainer,
    StaticResourceProvider,
};
use infrastructure_common::{
    AnyInstance, InjectionCategory, InjectionError, Qualifier, RequestKey, ResolutionError,
    ScopePolicy,
};
use injection_macros::Injectable;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct StatusLight;

#[derive(Debug)]
struct Greeting(String);

#[derive(Debug, PartialEq)]
struct Button(&'static str);

#[derive(Default, Injectable)]
struct ConsoleBase {
    #[inject(default)]
    light: Injected<StatusLight>,
}

#[derive(Default, Injectable)]
#[injectable(view_root = "content", on_injected = "mark_ready")]
struct Console {
    #[inject(named = "greeting")]
    greeting: Injected<Greeting>,
    #[inject_view(tag = "fire")]
    fire: Injected<Button>,
    #[inject_resource(id = 42)]
    title: Injected<String>,
    #[inject_extra(name = "operator", optional)]
    operator: Injected<String>,
    #[inject_base]
    base: ConsoleBase,
    content_view: Option<ViewRoot>,
    ready: bool,
}

impl Console {
    fn content(&self) -> Option<ViewRoot> {
        self.content_view.clone()
    }

    fn mark_ready(&mut self) {
        self.ready = true;
    }
}

struct MapViews {
    views: HashMap<(String, String), AnyInstance>,
}

impl MapViews {
    fn console() -> Self {
        let mut views: HashMap<(String, String), AnyInstance> = HashMap::new();
        views.insert(
            ("console".to_string(), "fire".to_string()),
            Arc::new(Button("fire")),
        );
        Self { views }
    }
}

impl ViewProvider for MapViews {
    fn find_view(&self, root: &ViewRoot, key: &RequestKey) -> Option<AnyInstance> {
        let tag = match key.qualifier()? {
            Qualifier::Name(tag) => tag.clone(),
            Qualifier::Id(id) => id.to_string(),
        };
        self.views.get(&(root.name().to_string(), tag)).cloned()
    }
}

fn container() -> ScopedContainer {
    ScopedContainer::builder()
        .configure(|registry| {
            registry.bind_instance(
                RequestKey::named::<Greeting>("greeting"),
                Greeting("你好".to_string()),
            );
        })
        .with_view_provider(Arc::new(MapViews::console()))
        .with_resource_provider(Arc::new(
            StaticResourceProvider::new().with_resource(42, "主控台".to_string()),
        ))
        .build()
        .unwrap()
}

fn console_with_view() -> Console {
    Console {
        content_view: Some(ViewRoot::new("console")),
        ..Console::default()
    }
}

#[test]
fn test_generated_manifest_layout() {
    let manifest = Console::manifest();
    let sections = manifest.sections();
    assert_eq!(sections.len(), 2);
    assert!(sections[0].declaring_type().short_name().ends_with("Console"));
    assert!(sections[1].declaring_type().short_name().ends_with("ConsoleBase"));

    let fields: Vec<_> = manifest.points().map(|point| point.field).collect();
    assert_eq!(fields, vec!["greeting", "fire", "title", "operator", "light"]);

    let categories: Vec<_> = manifest.points().map(|point| point.category).collect();
    assert_eq!(
        categories,
        vec![
            InjectionCategory::Value,
            InjectionCategory::View,
            InjectionCategory::Resource,
            InjectionCategory::Resource,
            InjectionCategory::Value,
        ]
    );

    let operator = manifest.points().nth(3).unwrap();
    assert!(operator.optional);
    assert_eq!(operator.key, RequestKey::named::<String>("operator"));
    let title = manifest.points().nth(2).unwrap();
    assert_eq!(title.key.id(), Some(42));
    let light = manifest.points().last().unwrap();
    assert!(light.key.type_info().is_constructible());
}

#[test]
fn test_derived_target_is_injected() {
    let container = container();
    let injector = Injector::default();
    let mut console = console_with_view();

    let report = injector.inject(&mut console, &container).unwrap();

    assert_eq!(report.injected, 4);
    assert_eq!(report.skipped_optional.len(), 1);
    assert_eq!(console.greeting.0, "你好");
    assert_eq!(*console.fire, Button("fire"));
    assert_eq!(console.title.as_str(), "主控台");
    assert!(!console.operator.is_injected());
    assert!(console.base.light.is_injected());
    assert!(console.ready);
}

#[test]
fn test_missing_view_hierarchy_fails_without_writes() {
    let container = container();
    let injector = Injector::default();
    let mut console = Console::default();

    let error = injector.inject(&mut console, &container).unwrap_err();
    let InjectionError::Unresolved { failures, .. } = error else {
        panic!("应当是 Unresolved");
    };
    assert_eq!(failures.len(), 1);
    assert!(failures[0].site.ends_with("Console::fire"));
    assert!(matches!(
        failures[0].error,
        ResolutionError::NoViewHierarchy { .. }
    ));
    assert!(!console.greeting.is_injected());
    assert!(!console.base.light.is_injected());
    assert!(!console.ready);
}

#[test]
fn test_restricted_scan_omits_base_section() {
    let sink = Arc::new(CollectingDiagnosticsSink::new());
    let scanner = ManifestScanner::from_names(true, &["Console"], sink.clone()).unwrap();
    let injector = Injector::new(scanner, sink.clone());
    let container = container();
    let mut console = console_with_view();

    let report = injector.inject(&mut console, &container).unwrap();

    assert_eq!(report.omitted_sections, 1);
    assert!(!console.base.light.is_injected());
    assert!(console.greeting.is_injected());
    assert!(sink
        .events()
        .iter()
        .any(|event| event.name() == "scan_omission"));
}

#[test]
fn test_base_binding_overrides_default_construction() {
    let container = ScopedContainer::builder()
        .configure(|registry| {
            registry.bind_default::<StatusLight>(ScopePolicy::Singleton);
        })
        .build()
        .unwrap();
    let injector = Injector::default();
    let mut base = ConsoleBase::default();

    injector.inject(&mut base, &container).unwrap();
    injector.inject(&mut ConsoleBase::default(), &container).unwrap();

    assert!(base.light.is_injected());
    assert_eq!(container.stats().singleton_hits, 1);
}
