//! 绑定注册表实现

use di_abstractions::{
    Binding, BindingRegistry, CircularDependencyDetector, DefaultCircularDependencyDetector,
    DiagnosticEvent, DiagnosticsSink, Factory, ProductionStrategy,
};
use infrastructure_common::{ConfigurationError, RequestKey, ScopePolicy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 基于 `HashMap` 的绑定注册表
///
/// 构建阶段可变，交给容器后只读。
#[derive(Default)]
pub struct BindingRegistryImpl {
    bindings: HashMap<RequestKey, Binding>,
    /// 注册顺序，用于稳定的遍历与报错
    order: Vec<RequestKey>,
    overrides: usize,
    sink: Option<Arc<dyn DiagnosticsSink>>,
}

impl BindingRegistryImpl {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置诊断出口（覆盖绑定时发出事件）
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 被覆盖的绑定次数
    pub fn override_count(&self) -> usize {
        self.overrides
    }

    /// 绑定到默认构造
    pub fn bind_default<T>(&mut self, scope: ScopePolicy) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register(
            RequestKey::constructible::<T>(),
            ProductionStrategy::DefaultConstruct,
            scope,
        );
        self
    }

    /// 绑定到预先存在的实例
    pub fn bind_instance<T>(&mut self, key: RequestKey, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.register(key, ProductionStrategy::instance(value), ScopePolicy::Singleton);
        self
    }

    /// 绑定到工厂
    pub fn bind_factory(&mut self, key: RequestKey, factory: Factory, scope: ScopePolicy) -> &mut Self {
        self.register(key, ProductionStrategy::Factory(factory), scope);
        self
    }

    /// 绑定到外部服务
    pub fn bind_service(&mut self, key: RequestKey, service: impl Into<String>) -> &mut Self {
        self.register(key, ProductionStrategy::external(service), ScopePolicy::Singleton);
        self
    }

    pub(crate) fn check_instances(&self) -> Result<(), ConfigurationError> {
        for binding in self.bindings() {
            if let ProductionStrategy::Instance(instance) = &binding.strategy {
                if !binding.key.type_info().matches(instance) {
                    return Err(ConfigurationError::IncompatibleBinding {
                        key: binding.key.clone(),
                        actual: format!("{:?}", (**instance).type_id()),
                    });
                }
            }
        }
        Ok(())
    }
}

impl BindingRegistry for BindingRegistryImpl {
    fn register(
        &mut self,
        key: RequestKey,
        strategy: ProductionStrategy,
        scope: ScopePolicy,
    ) -> Option<Binding> {
        let label = strategy.label();
        let binding = Binding::new(key.clone(), strategy, scope);
        let previous = self.bindings.insert(key.clone(), binding);

        match &previous {
            Some(old) => {
                self.overrides += 1;
                debug!(
                    "覆盖绑定: {} ({} -> {}, {:?})",
                    key,
                    old.strategy.label(),
                    label,
                    scope
                );
                if let Some(sink) = &self.sink {
                    sink.emit(&DiagnosticEvent::BindingOverridden {
                        key: key.to_string(),
                        strategy: label.to_string(),
                    });
                }
            }
            None => {
                debug!("注册绑定: {} ({}, {:?})", key, label, scope);
                self.order.push(key);
            }
        }

        previous
    }

    fn lookup(&self, key: &RequestKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    fn bindings(&self) -> Vec<&Binding> {
        self.order
            .iter()
            .filter_map(|key| self.bindings.get(key))
            .collect()
    }

    fn len(&self) -> usize {
        self.bindings.len()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        self.check_instances()?;

        let detector = DefaultCircularDependencyDetector;
        let graph = detector.build_dependency_graph(&self.bindings());
        detector.detect_circular_dependencies(&graph)
    }
}

impl std::fmt::Debug for BindingRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistryImpl")
            .field("bindings", &self.bindings())
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RemoteControl;

    struct Vibrator;

    #[test]
    fn test_last_registration_wins() {
        let mut registry = BindingRegistryImpl::new();
        let key = RequestKey::of::<RemoteControl>();

        assert!(registry
            .register(
                key.clone(),
                ProductionStrategy::DefaultConstruct,
                ScopePolicy::PerRequest
            )
            .is_none());
        let previous = registry.register(
            key.clone(),
            ProductionStrategy::instance(RemoteControl),
            ScopePolicy::Singleton,
        );

        assert!(matches!(
            previous.map(|binding| binding.strategy),
            Some(ProductionStrategy::DefaultConstruct)
        ));
        let binding = registry.lookup(&key).unwrap();
        assert!(matches!(binding.strategy, ProductionStrategy::Instance(_)));
        assert_eq!(binding.scope, ScopePolicy::Singleton);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.override_count(), 1);
    }

    #[test]
    fn test_lookup_miss_is_not_error() {
        let registry = BindingRegistryImpl::new();
        assert!(registry.lookup(&RequestKey::of::<Vibrator>()).is_none());
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_incompatible_instance() {
        let mut registry = BindingRegistryImpl::new();
        registry.bind_instance(RequestKey::of::<Vibrator>(), RemoteControl);

        let error = registry.validate().unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::IncompatibleBinding { .. }
        ));
    }

    #[test]
    fn test_factory_cycle_rejected() {
        let mut registry = BindingRegistryImpl::new();
        registry
            .bind_factory(
                RequestKey::of::<RemoteControl>(),
                Factory::with_dependency::<Vibrator, RemoteControl, _>(
                    RequestKey::of::<Vibrator>(),
                    |_| RemoteControl,
                ),
                ScopePolicy::Singleton,
            )
            .bind_factory(
                RequestKey::of::<Vibrator>(),
                Factory::with_dependency::<RemoteControl, Vibrator, _>(
                    RequestKey::of::<RemoteControl>(),
                    |_| Vibrator,
                ),
                ScopePolicy::Singleton,
            );

        let error = registry.validate().unwrap_err();
        assert_eq!(
            error.to_string(),
            "检测到循环绑定: RemoteControl -> Vibrator -> RemoteControl"
        );
    }
}
