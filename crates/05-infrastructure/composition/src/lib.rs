//! # 注入组合层
//!
//! 负责把注册表、容器、扫描器和注入器组合成一个可以直接使用的注入运行时。
//!
//! ## 主要功能
//!
//! - **配置加载**: TOML 文件 + `INJECT` 前缀的环境变量
//! - **绑定模块**: 默认模块在前，应用模块依次覆盖
//! - **运行时构建器**: 组装外部提供者、诊断出口、扫描白名单与日志
//! - **目标激活**: 目标创建后恰好注入一次，成功才可使用
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{InjectionBuilder, LoggingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = InjectionBuilder::new()
//!         .load_settings(Some("config/console.toml"))?
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     println!("扫描模式: {}", runtime.injector().scanner().mode());
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod builder;
pub mod module;
pub mod runtime;
pub mod settings;

// 重新导出主要类型
pub use bootstrapper::{Activation, Ready};
pub use builder::{InjectionBuilder, LoggingConfig};
pub use module::{BindingModule, DefaultModule};
pub use runtime::InjectionRuntime;
pub use settings::{
    ContainerSettings, InjectionSettings, LoggingSettings, ScannerSettings, ENV_PREFIX,
};

// 重新导出错误类型
pub use infrastructure_common::{ConfigurationError, InjectionError};
