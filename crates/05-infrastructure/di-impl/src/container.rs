//! 作用域容器实现

use crate::registry::BindingRegistryImpl;
use dashmap::DashMap;
use di_abstractions::{
    Binding, BindingRegistry, Container, ContainerConfig, ContainerStats, Dependencies,
    DiagnosticEvent, DiagnosticsSink, ExternalServiceProvider, NoopDiagnosticsSink,
    ProductionStrategy, ResolveContext, ResourceProvider, ViewProvider,
};
use infrastructure_common::{
    AnyInstance, ConfigurationError, RequestKey, ResolutionError, Scope, ScopePolicy,
};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, info};

type SingletonCell = Arc<OnceCell<AnyInstance>>;

/// 容器间共享的只读部分
struct Shared {
    registry: BindingRegistryImpl,
    services: Vec<Arc<dyn ExternalServiceProvider>>,
    views: Option<Arc<dyn ViewProvider>>,
    resources: Option<Arc<dyn ResourceProvider>>,
    sink: Arc<dyn DiagnosticsSink>,
    config: ContainerConfig,
}

#[derive(Default)]
struct StatsCounters {
    resolutions: AtomicU64,
    productions: AtomicU64,
    singleton_hits: AtomicU64,
    implicit_resolutions: AtomicU64,
    failures: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ContainerStats {
        ContainerStats {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            productions: self.productions.load(Ordering::Relaxed),
            singleton_hits: self.singleton_hits.load(Ordering::Relaxed),
            implicit_resolutions: self.implicit_resolutions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// 正在生产的单例：键归哪个线程生产，以及各线程在等哪个键
#[derive(Default)]
struct InFlight {
    owners: HashMap<RequestKey, ThreadId>,
    waiting: HashMap<ThreadId, RequestKey>,
}

impl InFlight {
    /// 当前线程等待 `key` 是否会形成跨线程的等待环，返回环上的键
    fn wait_cycle(&self, key: &RequestKey, me: ThreadId) -> Option<Vec<RequestKey>> {
        let mut path = vec![key.clone()];
        let mut owner = *self.owners.get(key)?;
        for _ in 0..=self.waiting.len() {
            if owner == me {
                return Some(path);
            }
            let next = self.waiting.get(&owner)?;
            path.push(next.clone());
            owner = *self.owners.get(next)?;
        }
        None
    }
}

/// 生产结束（包括 panic）时释放键的所有权并唤醒等待者
struct OwnerGuard<'a> {
    container: &'a ScopedContainer,
    key: &'a RequestKey,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.container.in_flight.lock().owners.remove(self.key);
        self.container.released.notify_all();
    }
}

/// 作用域容器
///
/// 单例缓存以作用域为边界：每个键一个 `OnceCell`，同一作用域内单例只生产一次。
/// 同一时刻只有一个线程生产某个键，其余线程等待；等待会成环时返回循环绑定错误。
pub struct ScopedContainer {
    scope: Scope,
    shared: Arc<Shared>,
    singletons: DashMap<RequestKey, SingletonCell>,
    in_flight: Mutex<InFlight>,
    released: Condvar,
    stats: StatsCounters,
}

impl ScopedContainer {
    /// 创建容器构建器
    pub fn builder() -> ScopedContainerBuilder {
        ScopedContainerBuilder::new()
    }

    /// 创建子作用域容器
    ///
    /// 共享注册表与提供者，单例缓存从空开始。
    pub fn child(&self, name: impl Into<String>) -> Self {
        let scope = self.scope.child(name);
        debug!("创建子作用域: {}", scope.name);
        Self {
            scope,
            shared: Arc::clone(&self.shared),
            singletons: DashMap::new(),
            in_flight: Mutex::new(InFlight::default()),
            released: Condvar::new(),
            stats: StatsCounters::default(),
        }
    }

    /// 绑定注册表
    pub fn registry(&self) -> &dyn BindingRegistry {
        &self.shared.registry
    }

    /// 诊断出口
    pub fn diagnostics(&self) -> Arc<dyn DiagnosticsSink> {
        Arc::clone(&self.shared.sink)
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.shared.config
    }

    /// 已缓存的单例数量
    pub fn cached_singletons(&self) -> usize {
        self.singletons
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn resolve_in(
        &self,
        key: &RequestKey,
        context: &mut ResolveContext,
    ) -> Result<AnyInstance, ResolutionError> {
        StatsCounters::bump(&self.stats.resolutions);
        context.push_key(key)?;
        let result = self.resolve_key(key, context);
        context.pop_key();

        if let Err(error) = &result {
            StatsCounters::bump(&self.stats.failures);
            debug!("解析失败: {} ({})", key, error);
        }
        result
    }

    fn resolve_key(
        &self,
        key: &RequestKey,
        context: &mut ResolveContext,
    ) -> Result<AnyInstance, ResolutionError> {
        match self.shared.registry.lookup(key) {
            Some(binding) => match binding.scope {
                ScopePolicy::Singleton => self.resolve_singleton(key, binding, context),
                ScopePolicy::PerRequest => self.produce(key, binding, context),
            },
            None => self.resolve_implicit(key),
        }
    }

    fn resolve_singleton(
        &self,
        key: &RequestKey,
        binding: &Binding,
        context: &mut ResolveContext,
    ) -> Result<AnyInstance, ResolutionError> {
        let cell = Arc::clone(self.singletons.entry(key.clone()).or_default().value());

        if let Some(instance) = cell.get() {
            StatsCounters::bump(&self.stats.singleton_hits);
            return Ok(Arc::clone(instance));
        }

        let me = thread::current().id();
        {
            let mut in_flight = self.in_flight.lock();
            loop {
                if let Some(instance) = cell.get() {
                    StatsCounters::bump(&self.stats.singleton_hits);
                    return Ok(Arc::clone(instance));
                }
                if !in_flight.owners.contains_key(key) {
                    in_flight.owners.insert(key.clone(), me);
                    break;
                }
                if let Some(path) = in_flight.wait_cycle(key, me) {
                    let cycle = path
                        .iter()
                        .chain(std::iter::once(key))
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    debug!("单例等待成环: {}", cycle);
                    return Err(ConfigurationError::CyclicBinding { cycle }.into());
                }
                in_flight.waiting.insert(me, key.clone());
                self.released.wait(&mut in_flight);
                in_flight.waiting.remove(&me);
            }
        }

        let _owner = OwnerGuard {
            container: self,
            key,
        };
        cell.get_or_try_init(|| self.produce(key, binding, context))
            .map(Arc::clone)
    }

    fn produce(
        &self,
        key: &RequestKey,
        binding: &Binding,
        context: &mut ResolveContext,
    ) -> Result<AnyInstance, ResolutionError> {
        StatsCounters::bump(&self.stats.productions);
        debug!("生产实例: {} ({})", key, binding.strategy.label());

        let instance = match &binding.strategy {
            ProductionStrategy::DefaultConstruct => binding
                .key
                .type_info()
                .construct()
                .or_else(|| key.type_info().construct())
                .ok_or_else(|| ResolutionError::production_failed(key, "类型没有默认构造器"))?,
            ProductionStrategy::Factory(factory) => {
                let mut values = Vec::with_capacity(factory.dependencies().len());
                for dependency in factory.dependencies() {
                    let value = self
                        .resolve_in(dependency, context)
                        .map_err(|error| match error {
                            ResolutionError::Configuration(_) => error,
                            other => ResolutionError::Dependency {
                                key: key.clone(),
                                source: Box::new(other),
                            },
                        })?;
                    values.push(value);
                }
                let dependencies = Dependencies::new(factory.dependencies().to_vec(), values);
                factory
                    .produce(&dependencies)
                    .map_err(|error| ResolutionError::production_failed(key, error.to_string()))?
            }
            ProductionStrategy::ExternalService { service } => self.fetch_service(key, service)?,
            ProductionStrategy::Instance(instance) => Arc::clone(instance),
        };

        Self::check_type(key, instance)
    }

    fn resolve_implicit(&self, key: &RequestKey) -> Result<AnyInstance, ResolutionError> {
        for provider in &self.shared.services {
            if let Some(service) = provider.recognizes(key) {
                self.note_implicit(key, format!("external-service:{}:{service}", provider.name()));
                let instance = provider.fetch(&service, key).ok_or_else(|| {
                    ResolutionError::ExternalServiceNotFound {
                        key: key.clone(),
                        service: service.clone(),
                    }
                })?;
                return Self::check_type(key, instance);
            }
        }

        if let Some(instance) = key.type_info().construct() {
            self.note_implicit(key, "default-construct".to_string());
            StatsCounters::bump(&self.stats.productions);
            return Self::check_type(key, instance);
        }

        Err(ResolutionError::NoBinding { key: key.clone() })
    }

    fn note_implicit(&self, key: &RequestKey, strategy: String) {
        StatsCounters::bump(&self.stats.implicit_resolutions);
        debug!("隐式解析: {} ({})", key, strategy);
        self.shared.sink.emit(&DiagnosticEvent::ImplicitResolution {
            key: key.to_string(),
            strategy,
        });
    }

    fn fetch_service(&self, key: &RequestKey, service: &str) -> Result<AnyInstance, ResolutionError> {
        if self.shared.services.is_empty() {
            return Err(ResolutionError::ProviderUnavailable {
                key: key.clone(),
                provider: "外部服务",
            });
        }

        self.shared
            .services
            .iter()
            .find_map(|provider| provider.fetch(service, key))
            .ok_or_else(|| ResolutionError::ExternalServiceNotFound {
                key: key.clone(),
                service: service.to_string(),
            })
    }

    fn check_type(key: &RequestKey, instance: AnyInstance) -> Result<AnyInstance, ResolutionError> {
        if key.type_info().matches(&instance) {
            Ok(instance)
        } else {
            Err(ResolutionError::TypeMismatch {
                key: key.clone(),
                actual: format!("{:?}", (*instance).type_id()),
            })
        }
    }
}

impl Container for ScopedContainer {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn resolve(&self, key: &RequestKey) -> Result<AnyInstance, ResolutionError> {
        let mut context = ResolveContext::with_max_depth(self.shared.config.max_resolution_depth);
        self.resolve_in(key, &mut context)
    }

    fn is_bound(&self, key: &RequestKey) -> bool {
        self.shared.registry.lookup(key).is_some()
    }

    fn view_provider(&self) -> Option<&dyn ViewProvider> {
        self.shared.views.as_deref()
    }

    fn resource_provider(&self) -> Option<&dyn ResourceProvider> {
        self.shared.resources.as_deref()
    }

    fn stats(&self) -> ContainerStats {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for ScopedContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedContainer")
            .field("scope", &self.scope.name)
            .field("bindings", &self.shared.registry.len())
            .field("singletons", &self.singletons.len())
            .finish_non_exhaustive()
    }
}

/// 作用域容器构建器
pub struct ScopedContainerBuilder {
    registry: BindingRegistryImpl,
    services: Vec<Arc<dyn ExternalServiceProvider>>,
    views: Option<Arc<dyn ViewProvider>>,
    resources: Option<Arc<dyn ResourceProvider>>,
    sink: Arc<dyn DiagnosticsSink>,
    config: ContainerConfig,
    scope: Scope,
}

impl ScopedContainerBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self {
            registry: BindingRegistryImpl::new(),
            services: Vec::new(),
            views: None,
            resources: None,
            sink: Arc::new(NoopDiagnosticsSink),
            config: ContainerConfig::default(),
            scope: Scope::root(),
        }
    }

    /// 使用已填充的注册表
    #[must_use]
    pub fn with_registry(mut self, registry: BindingRegistryImpl) -> Self {
        self.registry = registry;
        self
    }

    /// 直接修改注册表
    #[must_use]
    pub fn configure(mut self, configure: impl FnOnce(&mut BindingRegistryImpl)) -> Self {
        configure(&mut self.registry);
        self
    }

    /// 添加外部服务提供者（按添加顺序询问）
    #[must_use]
    pub fn with_service_provider(mut self, provider: Arc<dyn ExternalServiceProvider>) -> Self {
        self.services.push(provider);
        self
    }

    /// 设置视图提供者
    #[must_use]
    pub fn with_view_provider(mut self, provider: Arc<dyn ViewProvider>) -> Self {
        self.views = Some(provider);
        self
    }

    /// 设置资源提供者
    #[must_use]
    pub fn with_resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(provider);
        self
    }

    /// 设置诊断出口
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 设置容器配置
    #[must_use]
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置根作用域
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// 校验绑定并构建容器
    pub fn build(self) -> Result<ScopedContainer, ConfigurationError> {
        if self.config.detect_cycles {
            self.registry.validate()?;
        } else {
            self.registry.check_instances()?;
        }

        info!(
            "容器已创建: 作用域 {}, {} 个绑定, {} 个外部服务提供者",
            self.scope.name,
            self.registry.len(),
            self.services.len()
        );

        Ok(ScopedContainer {
            scope: self.scope,
            shared: Arc::new(Shared {
                registry: self.registry,
                services: self.services,
                views: self.views,
                resources: self.resources,
                sink: self.sink,
                config: self.config,
            }),
            singletons: DashMap::new(),
            in_flight: Mutex::new(InFlight::default()),
            released: Condvar::new(),
            stats: StatsCounters::default(),
        })
    }
}

impl Default for ScopedContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
