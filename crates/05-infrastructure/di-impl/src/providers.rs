//! 内存中的外部提供者
//!
//! 宿主可以直接使用，也方便测试。

use di_abstractions::{ExternalServiceProvider, ResourceProvider};
use infrastructure_common::{AnyInstance, Qualifier, RequestKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// 按请求键保存值的资源提供者
#[derive(Default)]
pub struct StaticResourceProvider {
    values: HashMap<RequestKey, AnyInstance>,
}

impl StaticResourceProvider {
    /// 创建空提供者
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记资源 id 对应的值
    #[must_use]
    pub fn with_resource<T: Send + Sync + 'static>(mut self, id: i64, value: T) -> Self {
        self.values
            .insert(RequestKey::with_type_id::<T>(id), Arc::new(value));
        self
    }

    /// 登记 extra 名称对应的值
    #[must_use]
    pub fn with_extra<T: Send + Sync + 'static>(mut self, name: &str, value: T) -> Self {
        self.values.insert(RequestKey::named::<T>(name), Arc::new(value));
        self
    }

    /// 登记的值数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ResourceProvider for StaticResourceProvider {
    fn lookup(&self, key: &RequestKey) -> Option<AnyInstance> {
        self.values.get(key).cloned()
    }
}

impl std::fmt::Debug for StaticResourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticResourceProvider")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 按服务名称保存单例的外部服务提供者
///
/// 识别规则：请求键带名称限定符且该名称已登记，或键的类型登记过默认服务名。
pub struct StaticServiceProvider {
    name: String,
    services: HashMap<String, AnyInstance>,
    by_type: HashMap<TypeId, String>,
}

impl StaticServiceProvider {
    /// 创建提供者
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// 登记服务，并把类型 `T` 的未限定请求识别为该服务
    #[must_use]
    pub fn with_service<T: Send + Sync + 'static>(mut self, service: &str, value: T) -> Self {
        self.services.insert(service.to_string(), Arc::new(value));
        self.by_type.insert(TypeId::of::<T>(), service.to_string());
        self
    }

    /// 已登记的服务名称
    pub fn services(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ExternalServiceProvider for StaticServiceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognizes(&self, key: &RequestKey) -> Option<String> {
        match key.qualifier() {
            Some(Qualifier::Name(service)) if self.services.contains_key(service) => {
                Some(service.clone())
            }
            Some(_) => None,
            None => self.by_type.get(&key.type_id()).cloned(),
        }
    }

    fn fetch(&self, service: &str, _key: &RequestKey) -> Option<AnyInstance> {
        self.services.get(service).cloned()
    }
}

impl std::fmt::Debug for StaticServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticServiceProvider")
            .field("name", &self.name)
            .field("services", &self.services())
            .finish()
    }
}
