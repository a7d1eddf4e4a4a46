//! 注入运行时

use crate::bootstrapper::{Activation, Ready};
use crate::settings::InjectionSettings;
use di_abstractions::{Container, ContainerStats, InjectionTarget};
use di_impl::{InjectionPhase, InjectionReport, Injector, ScopedContainer};
use infrastructure_common::InjectionError;

/// 注入运行时
///
/// 持有根作用域容器、注入器和生效的配置。
#[derive(Debug)]
pub struct InjectionRuntime {
    container: ScopedContainer,
    injector: Injector,
    settings: InjectionSettings,
}

impl InjectionRuntime {
    pub(crate) fn new(
        container: ScopedContainer,
        injector: Injector,
        settings: InjectionSettings,
    ) -> Self {
        Self {
            container,
            injector,
            settings,
        }
    }

    /// 根作用域容器
    pub fn container(&self) -> &ScopedContainer {
        &self.container
    }

    /// 注入器
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// 生效的配置
    pub fn settings(&self) -> &InjectionSettings {
        &self.settings
    }

    /// 容器统计信息
    pub fn stats(&self) -> ContainerStats {
        self.container.stats()
    }

    /// 创建子作用域容器
    pub fn child_scope(&self, name: impl Into<String>) -> ScopedContainer {
        self.container.child(name)
    }

    /// 在根作用域中注入目标
    pub fn inject<T: InjectionTarget>(&self, target: &mut T) -> Result<InjectionReport, InjectionError> {
        self.injector.inject(target, &self.container)
    }

    /// 在根作用域中注入目标的指定阶段
    pub fn inject_phase<T: InjectionTarget>(
        &self,
        target: &mut T,
        phase: InjectionPhase,
    ) -> Result<InjectionReport, InjectionError> {
        self.injector.inject_phase(target, &self.container, phase)
    }

    /// 创建目标并注入，成功后才交给调用方
    pub fn activate<T: InjectionTarget>(&self, target: T) -> Result<Ready<T>, InjectionError> {
        Activation::new(target).run(&self.injector, &self.container)
    }

    /// 在指定容器（通常是子作用域）中创建目标并注入
    pub fn activate_in<T: InjectionTarget>(
        &self,
        target: T,
        container: &dyn Container,
    ) -> Result<Ready<T>, InjectionError> {
        Activation::new(target).run(&self.injector, container)
    }
}
