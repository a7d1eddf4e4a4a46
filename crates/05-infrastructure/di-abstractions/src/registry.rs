//! 绑定注册表抽象接口

use crate::factory::Factory;
use infrastructure_common::{AnyInstance, ConfigurationError, RequestKey, ScopePolicy};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// 生产策略
#[derive(Clone)]
pub enum ProductionStrategy {
    /// 使用请求键类型的零参构造器
    DefaultConstruct,
    /// 调用工厂（先解析其声明的依赖）
    Factory(Factory),
    /// 从外部服务提供者获取指定名称的服务
    ExternalService { service: String },
    /// 返回预先存在的实例
    Instance(AnyInstance),
}

impl ProductionStrategy {
    /// 预先存在的实例
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Instance(Arc::new(value))
    }

    /// 外部服务
    pub fn external(service: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
        }
    }

    /// 策略依赖的请求键
    pub fn dependencies(&self) -> &[RequestKey] {
        match self {
            Self::Factory(factory) => factory.dependencies(),
            _ => &[],
        }
    }

    /// 策略名称（用于日志与诊断）
    pub fn label(&self) -> &'static str {
        match self {
            Self::DefaultConstruct => "default-construct",
            Self::Factory(_) => "factory",
            Self::ExternalService { .. } => "external-service",
            Self::Instance(_) => "instance",
        }
    }
}

impl fmt::Debug for ProductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultConstruct => f.write_str("DefaultConstruct"),
            Self::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
            Self::ExternalService { service } => f
                .debug_struct("ExternalService")
                .field("service", service)
                .finish(),
            Self::Instance(_) => f.write_str("Instance(<instance>)"),
        }
    }
}

/// 绑定
#[derive(Debug, Clone)]
pub struct Binding {
    /// 请求键
    pub key: RequestKey,
    /// 生产策略
    pub strategy: ProductionStrategy,
    /// 作用域策略
    pub scope: ScopePolicy,
}

impl Binding {
    /// 创建新的绑定
    pub fn new(key: RequestKey, strategy: ProductionStrategy, scope: ScopePolicy) -> Self {
        Self {
            key,
            strategy,
            scope,
        }
    }
}

/// 绑定注册表 trait
///
/// 注册允许覆盖：同一请求键后注册的绑定生效。查不到绑定不是错误，
/// 调用方会回退到隐式策略。
pub trait BindingRegistry: Send + Sync {
    /// 注册绑定，返回被覆盖的旧绑定
    fn register(
        &mut self,
        key: RequestKey,
        strategy: ProductionStrategy,
        scope: ScopePolicy,
    ) -> Option<Binding>;

    /// 查找绑定
    fn lookup(&self, key: &RequestKey) -> Option<&Binding>;

    /// 所有绑定
    fn bindings(&self) -> Vec<&Binding>;

    /// 绑定数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 构建期验证（循环绑定、类型不兼容的实例）
    fn validate(&self) -> Result<(), ConfigurationError>;
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 请求键
    pub key: RequestKey,
    /// 依赖的请求键
    pub dependencies: Vec<RequestKey>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖
    fn detect_circular_dependencies(
        &self,
        graph: &[DependencyGraphNode],
    ) -> Result<(), ConfigurationError>;

    /// 构建依赖图
    fn build_dependency_graph(&self, bindings: &[&Binding]) -> Vec<DependencyGraphNode>;
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(
        &self,
        graph: &[DependencyGraphNode],
    ) -> Result<(), ConfigurationError> {
        // 使用深度优先搜索检测循环依赖
        let edges: HashMap<&RequestKey, &[RequestKey]> = graph
            .iter()
            .map(|node| (&node.key, node.dependencies.as_slice()))
            .collect();
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for node in graph {
            if !visited.contains(&node.key) {
                Self::dfs_check(&node.key, &edges, &mut visited, &mut path)?;
            }
        }

        Ok(())
    }

    fn build_dependency_graph(&self, bindings: &[&Binding]) -> Vec<DependencyGraphNode> {
        bindings
            .iter()
            .map(|binding| DependencyGraphNode {
                key: binding.key.clone(),
                dependencies: binding.strategy.dependencies().to_vec(),
            })
            .collect()
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check(
        current: &RequestKey,
        edges: &HashMap<&RequestKey, &[RequestKey]>,
        visited: &mut HashSet<RequestKey>,
        path: &mut Vec<RequestKey>,
    ) -> Result<(), ConfigurationError> {
        if let Some(start) = path.iter().position(|key| key == current) {
            // 检测到循环依赖
            let cycle = path[start..]
                .iter()
                .chain(std::iter::once(current))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ConfigurationError::CyclicBinding { cycle });
        }

        if visited.contains(current) {
            return Ok(());
        }

        path.push(current.clone());

        // 未注册的键走隐式策略，没有依赖
        if let Some(dependencies) = edges.get(current) {
            for dependency in dependencies.iter() {
                Self::dfs_check(dependency, edges, visited, path)?;
            }
        }

        path.pop();
        visited.insert(current.clone());

        Ok(())
    }
}
