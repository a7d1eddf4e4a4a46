//! 目标激活
//!
//! 宿主侧的生命周期钩子：目标创建之后、首次使用之前恰好注入一次。
//! 注入失败的目标随 [`Activation`] 一起被丢弃，调用方拿不到部分注入的状态。

use di_abstractions::{Container, InjectionTarget};
use di_impl::{InjectionPhase, InjectionReport, Injector};
use infrastructure_common::{InjectionError, InjectionState};
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// 正在激活的目标
#[derive(Debug)]
pub struct Activation<T> {
    target: T,
    state: InjectionState,
    members: Option<InjectionReport>,
}

impl<T: InjectionTarget> Activation<T> {
    /// 包装新创建的目标
    pub fn new(target: T) -> Self {
        Self {
            target,
            state: InjectionState::Uninjected,
            members: None,
        }
    }

    /// 当前状态
    pub fn state(&self) -> InjectionState {
        self.state
    }

    /// 访问目标（例如在两个阶段之间设置内容视图）
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// 第一阶段：注入普通值与资源
    pub fn inject_members(
        &mut self,
        injector: &Injector,
        container: &dyn Container,
    ) -> Result<&InjectionReport, InjectionError> {
        if !self.state.can_inject() {
            return Err(self.already_injected());
        }

        self.state = InjectionState::Injecting;
        match injector.inject_phase(&mut self.target, container, InjectionPhase::Members) {
            Ok(report) => Ok(self.members.insert(report)),
            Err(error) => {
                self.state = InjectionState::Failed;
                Err(error)
            }
        }
    }

    /// 完成注入：先前注入过成员时只注入视图，否则注入全部
    pub fn complete(
        mut self,
        injector: &Injector,
        container: &dyn Container,
    ) -> Result<Ready<T>, InjectionError> {
        let phase = match self.state {
            InjectionState::Uninjected => InjectionPhase::All,
            InjectionState::Injecting => InjectionPhase::Views,
            InjectionState::Ready | InjectionState::Failed => {
                return Err(self.already_injected());
            }
        };

        match injector.inject_phase(&mut self.target, container, phase) {
            Ok(mut report) => {
                if let Some(members) = self.members.take() {
                    report.injected += members.injected;
                    report.skipped_optional.extend(members.skipped_optional);
                    report.elapsed += members.elapsed;
                }
                self.state = InjectionState::Ready;
                debug!("目标就绪: {}", report.target);
                Ok(Ready {
                    target: self.target,
                    report,
                })
            }
            Err(error) => {
                warn!("目标注入失败, 丢弃: {}", error);
                Err(error)
            }
        }
    }

    /// 一次性完成全部注入
    pub fn run(self, injector: &Injector, container: &dyn Container) -> Result<Ready<T>, InjectionError> {
        self.complete(injector, container)
    }

    fn already_injected(&self) -> InjectionError {
        InjectionError::AlreadyInjected {
            target: T::manifest().target().to_string(),
        }
    }
}

/// 注入完成、可以使用的目标
#[derive(Debug)]
pub struct Ready<T> {
    target: T,
    report: InjectionReport,
}

impl<T> Ready<T> {
    /// 注入报告
    pub fn report(&self) -> &InjectionReport {
        &self.report
    }

    /// 取出目标
    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<T> Deref for Ready<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target
    }
}

impl<T> DerefMut for Ready<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.target
    }
}
