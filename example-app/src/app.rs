//! 遥控台的注入装配

use crate::screens::AstroboyRemoteControl;
use crate::services::{SystemServices, Vibrator, VIBRATOR_SERVICE};
use crate::views::ViewHierarchy;
use di_impl::{BindingRegistryImpl, StaticResourceProvider};
use infrastructure_common::ScopePolicy;
use infrastructure_composition::{DefaultModule, InjectionBuilder, InjectionSettings};
use std::sync::Arc;

/// 应用名称的资源 id
pub const APP_NAME_RESOURCE: i64 = 1;

/// 操作员名称的 extra
pub const OPERATOR_EXTRA: &str = "operator";

/// 遥控台模块：同一作用域内的界面共用一个遥控器
pub fn console_module(registry: &mut BindingRegistryImpl) {
    registry.bind_default::<AstroboyRemoteControl>(ScopePolicy::Singleton);
}

/// 组装注入运行时构建器
pub fn builder(settings: InjectionSettings, operator: Option<&str>) -> InjectionBuilder {
    let mut resources = StaticResourceProvider::new()
        .with_resource(APP_NAME_RESOURCE, "阿童木遥控台".to_string());
    if let Some(operator) = operator {
        resources = resources.with_extra(OPERATOR_EXTRA, operator.to_string());
    }

    InjectionBuilder::new()
        .with_settings(settings.clone())
        .with_default_module(
            DefaultModule::new(settings).with_service::<Vibrator>(VIBRATOR_SERVICE),
        )
        .install(console_module)
        .with_service_provider(SystemServices::open())
        .with_view_provider(Arc::new(ViewHierarchy::astroboy()))
        .with_resource_provider(Arc::new(resources))
}
