//! 绑定模块
//!
//! 模块按安装顺序配置注册表，后安装的模块覆盖先安装的同键绑定，
//! 应用自己的模块可以叠加在默认模块之上。

use crate::settings::InjectionSettings;
use di_impl::BindingRegistryImpl;
use infrastructure_common::RequestKey;

/// 绑定模块 trait
pub trait BindingModule: Send + Sync {
    /// 模块名称
    fn name(&self) -> &str;

    /// 向注册表添加绑定
    fn configure(&self, registry: &mut BindingRegistryImpl);
}

impl<F> BindingModule for F
where
    F: Fn(&mut BindingRegistryImpl) + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn configure(&self, registry: &mut BindingRegistryImpl) {
        self(registry);
    }
}

/// 默认模块
///
/// 把加载的配置登记为实例，并把常用类型映射到命名的外部服务。
#[derive(Debug, Clone, Default)]
pub struct DefaultModule {
    settings: InjectionSettings,
    services: Vec<(RequestKey, String)>,
}

impl DefaultModule {
    /// 创建默认模块
    pub fn new(settings: InjectionSettings) -> Self {
        Self {
            settings,
            services: Vec::new(),
        }
    }

    /// 将类型 `T` 映射到外部服务
    #[must_use]
    pub fn with_service<T: ?Sized + 'static>(mut self, service: impl Into<String>) -> Self {
        self.services.push((RequestKey::of::<T>(), service.into()));
        self
    }
}

impl BindingModule for DefaultModule {
    fn name(&self) -> &str {
        "default"
    }

    fn configure(&self, registry: &mut BindingRegistryImpl) {
        registry.bind_instance(RequestKey::of::<InjectionSettings>(), self.settings.clone());
        for (key, service) in &self.services {
            registry.bind_service(key.clone(), service.clone());
        }
    }
}
