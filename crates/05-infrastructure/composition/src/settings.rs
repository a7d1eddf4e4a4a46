//! 注入配置
//!
//! 配置来源按优先级从低到高：内置默认值、可选的 TOML 文件、`INJECT` 前缀的环境变量
//! （层级用 `__` 分隔，例如 `INJECT__SCANNER__RESTRICTED=true`）。

use di_abstractions::{AllowList, ContainerConfig, DEFAULT_MAX_RESOLUTION_DEPTH};
use infrastructure_common::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "INJECT";

/// 注入配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionSettings {
    /// 扫描器配置
    pub scanner: ScannerSettings,
    /// 容器配置
    pub container: ContainerSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 扫描器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// 是否只扫描白名单内的类型
    pub restricted: bool,
    /// 白名单（类型的完整路径或简短名称）
    pub allow_list: Vec<String>,
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 构建时是否检测循环绑定
    pub detect_cycles: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 是否输出 JSON
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl InjectionSettings {
    /// 从可选的配置文件和环境变量加载
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("加载注入配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scanner.allow_list"),
        );

        Self::finish(builder)
    }

    /// 从 TOML 文本加载（不读取环境变量）
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigurationError> {
        let settings: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| {
                error!("注入配置加载失败: {}", e);
                ConfigurationError::settings(e.to_string())
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.container.max_resolution_depth == 0 {
            return Err(ConfigurationError::settings(
                "container.max_resolution_depth 必须大于 0",
            ));
        }
        if self.scanner.restricted {
            AllowList::from_names(&self.scanner.allow_list)?;
        }
        Ok(())
    }

    /// 容器配置
    pub fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            detect_cycles: self.container.detect_cycles,
            max_resolution_depth: self.container.max_resolution_depth,
        }
    }

    /// 扫描白名单；未启用受限扫描时为 `None`
    pub fn allow_list(&self) -> Result<Option<AllowList>, ConfigurationError> {
        if self.scanner.restricted {
            AllowList::from_names(&self.scanner.allow_list).map(Some)
        } else {
            Ok(None)
        }
    }
}
