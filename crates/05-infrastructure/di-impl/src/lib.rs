//! # 注入机制具体实现
//!
//! 提供绑定注册表、作用域容器、清单扫描器、注入器以及诊断出口的实现。
//!
//! ```no_run
//! use di_impl::{Injector, ScopedContainer};
//!
//! let container = ScopedContainer::builder().build()?;
//! let injector = Injector::default();
//! # let _ = (container, injector);
//! # Ok::<(), infrastructure_common::ConfigurationError>(())
//! ```

pub mod container;
pub mod diagnostics;
pub mod injector;
pub mod providers;
pub mod registry;
pub mod scanner;

pub use container::{ScopedContainer, ScopedContainerBuilder};
pub use diagnostics::{CollectingDiagnosticsSink, TracingDiagnosticsSink};
pub use injector::{InjectionPhase, InjectionReport, Injector};
pub use providers::{StaticResourceProvider, StaticServiceProvider};
pub use registry::BindingRegistryImpl;
pub use scanner::ManifestScanner;
