//! 注入运行时构建器

use crate::module::{BindingModule, DefaultModule};
use crate::runtime::InjectionRuntime;
use crate::settings::{InjectionSettings, LoggingSettings};
use di_abstractions::{
    AllowList, DiagnosticsSink, ExternalServiceProvider, ResourceProvider, ViewProvider,
};
use di_impl::{
    BindingRegistryImpl, Injector, ManifestScanner, ScopedContainer, TracingDiagnosticsSink,
};
use infrastructure_common::{ConfigurationError, Scope};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 注入运行时构建器
///
/// 使用建造者模式组装注册表、容器、扫描器与注入器
pub struct InjectionBuilder {
    /// 注入配置
    settings: InjectionSettings,
    /// 默认模块
    default_module: Option<DefaultModule>,
    /// 应用模块（按安装顺序）
    modules: Vec<Box<dyn BindingModule>>,
    /// 外部服务提供者
    services: Vec<Arc<dyn ExternalServiceProvider>>,
    /// 视图提供者
    views: Option<Arc<dyn ViewProvider>>,
    /// 资源提供者
    resources: Option<Arc<dyn ResourceProvider>>,
    /// 诊断出口
    sink: Arc<dyn DiagnosticsSink>,
    /// 显式指定的白名单（优先于配置）
    allow_list: Option<AllowList>,
    /// 根作用域名称
    scope_name: String,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl InjectionBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            settings: InjectionSettings::default(),
            default_module: None,
            modules: Vec::new(),
            services: Vec::new(),
            views: None,
            resources: None,
            sink: Arc::new(TracingDiagnosticsSink),
            allow_list: None,
            scope_name: "root".to_string(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 使用已加载的配置
    #[must_use]
    pub fn with_settings(mut self, settings: InjectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 从配置文件与环境变量加载配置
    pub fn load_settings<P: AsRef<Path>>(mut self, path: Option<P>) -> Result<Self, ConfigurationError> {
        let path: Option<&Path> = path.as_ref().map(AsRef::as_ref);
        if let Some(path) = path {
            info!("加载注入配置: {}", path.display());
        }
        self.settings = InjectionSettings::load(path)?;
        Ok(self)
    }

    /// 设置默认模块（不设置时使用只登记配置的默认模块）
    #[must_use]
    pub fn with_default_module(mut self, module: DefaultModule) -> Self {
        self.default_module = Some(module);
        self
    }

    /// 安装绑定模块，后安装的覆盖先安装的
    #[must_use]
    pub fn install<M: BindingModule + 'static>(mut self, module: M) -> Self {
        debug!("安装绑定模块: {}", module.name());
        self.modules.push(Box::new(module));
        self
    }

    /// 添加外部服务提供者
    #[must_use]
    pub fn with_service_provider<P: ExternalServiceProvider + 'static>(mut self, provider: P) -> Self {
        debug!("添加外部服务提供者: {}", provider.name());
        self.services.push(Arc::new(provider));
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

    /// 显式指定扫描白名单
    #[must_use]
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    /// 设置根作用域名称
    #[must_use]
    pub fn with_scope_name(mut self, name: impl Into<String>) -> Self {
        self.scope_name = name.into();
        self
    }

    /// 配置日志
    #[must_use]
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建注入运行时
    pub fn build(self) -> Result<InjectionRuntime, ConfigurationError> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        info!("开始构建注入运行时");
        self.settings.validate()?;

        let mut registry = BindingRegistryImpl::new().with_diagnostics(Arc::clone(&self.sink));
        let default_module = self
            .default_module
            .unwrap_or_else(|| DefaultModule::new(self.settings.clone()));
        default_module.configure(&mut registry);
        for module in &self.modules {
            debug!("配置绑定模块: {}", module.name());
            module.configure(&mut registry);
        }

        let allow_list = match self.allow_list {
            Some(allow_list) => Some(allow_list),
            None => self.settings.allow_list()?,
        };
        let scanner = ManifestScanner::new(allow_list, Arc::clone(&self.sink));

        let mut container = ScopedContainer::builder()
            .with_registry(registry)
            .with_config(self.settings.container_config())
            .with_diagnostics(Arc::clone(&self.sink))
            .with_scope(Scope::new(self.scope_name));
        for provider in self.services {
            container = container.with_service_provider(provider);
        }
        if let Some(views) = self.views {
            container = container.with_view_provider(views);
        }
        if let Some(resources) = self.resources {
            container = container.with_resource_provider(resources);
        }
        let container = container.build()?;

        let injector = Injector::new(scanner, self.sink);
        info!(
            "注入运行时构建完成: 扫描模式 {}, {} 个模块",
            injector.scanner().mode(),
            self.modules.len() + 1
        );

        Ok(InjectionRuntime::new(container, injector, self.settings))
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> Result<(), ConfigurationError> {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.logging_config.env_filter())
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        let result = if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };
        result.map_err(|e| ConfigurationError::settings(format!("日志初始化失败: {e}")))?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for InjectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 日志过滤器：设置了 `RUST_LOG` 时以其为准，否则使用配置的级别
    pub fn env_filter(&self) -> EnvFilter {
        self.filter_with(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
    }

    fn filter_with(&self, directives: Option<&str>) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .parse_lossy(directives.unwrap_or_default())
    }

    /// 从配置文件中的日志配置创建
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, ConfigurationError> {
        let level = tracing::Level::from_str(&settings.level).map_err(|_| {
            ConfigurationError::settings(format!("无效的日志级别: {}", settings.level))
        })?;
        Ok(Self {
            level,
            json_format: settings.json,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_from_settings() {
        let config = LoggingConfig::from_settings(&LoggingSettings {
            level: "debug".to_string(),
            json: true,
        })
        .unwrap();
        assert_eq!(config.level, tracing::Level::DEBUG);
        assert!(config.json_format);

        assert!(LoggingConfig::from_settings(&LoggingSettings {
            level: "loud".to_string(),
            json: false,
        })
        .is_err());
    }

    #[test]
    fn test_env_filter_prefers_directives() {
        let config = LoggingConfig::development();
        assert_eq!(
            config.filter_with(None).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            config.filter_with(Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }
}
