//! 工厂策略
//!
//! 工厂声明自己依赖的请求键，容器先（嵌套地）解析这些依赖，再调用工厂生产实例。
//! 依赖声明同时构成注册表在构建期做循环检测的依赖图。

use infrastructure_common::{AnyInstance, RequestKey, ResolutionError};
use std::fmt;
use std::sync::Arc;

/// 工厂错误类型
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// 工厂函数类型
pub type FactoryFn =
    Arc<dyn Fn(&Dependencies) -> Result<AnyInstance, FactoryError> + Send + Sync>;

/// 已解析的工厂依赖，顺序与 [`Factory::dependencies`] 一致
#[derive(Clone, Default)]
pub struct Dependencies {
    keys: Vec<RequestKey>,
    values: Vec<AnyInstance>,
}

impl Dependencies {
    /// 创建依赖集合
    pub fn new(keys: Vec<RequestKey>, values: Vec<AnyInstance>) -> Self {
        Self { keys, values }
    }

    /// 依赖数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有依赖
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按下标获取未转型的依赖
    pub fn raw(&self, index: usize) -> Option<&AnyInstance> {
        self.values.get(index)
    }

    /// 按下标获取依赖并向下转型
    pub fn get<T>(&self, index: usize) -> Result<Arc<T>, ResolutionError>
    where
        T: Send + Sync + 'static,
    {
        let requested = RequestKey::of::<T>();
        let value = self.values.get(index).ok_or_else(|| {
            ResolutionError::production_failed(
                &requested,
                format!("依赖下标 {index} 越界，共 {} 个依赖", self.values.len()),
            )
        })?;

        value
            .clone()
            .downcast::<T>()
            .map_err(|_| ResolutionError::TypeMismatch {
                key: self.keys.get(index).cloned().unwrap_or(requested),
                actual: format!("{:?}", (**value).type_id()),
            })
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// 工厂
#[derive(Clone)]
pub struct Factory {
    name: String,
    dependencies: Vec<RequestKey>,
    produce: FactoryFn,
}

impl Factory {
    /// 创建工厂
    pub fn new<F>(name: impl Into<String>, dependencies: Vec<RequestKey>, produce: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<AnyInstance, FactoryError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dependencies,
            produce: Arc::new(produce),
        }
    }

    /// 无依赖工厂
    pub fn from_fn<T, F>(produce: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), Vec::new(), move |_| {
            Ok(Arc::new(produce()) as AnyInstance)
        })
    }

    /// 可能失败的无依赖工厂
    pub fn try_from_fn<T, F>(produce: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), Vec::new(), move |_| {
            produce().map(|value| Arc::new(value) as AnyInstance)
        })
    }

    /// 单依赖工厂
    pub fn with_dependency<D, T, F>(dependency: RequestKey, produce: F) -> Self
    where
        D: Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(Arc<D>) -> T + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), vec![dependency], move |deps| {
            let dependency = deps.get::<D>(0)?;
            Ok(Arc::new(produce(dependency)) as AnyInstance)
        })
    }

    /// 工厂名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 所需的依赖键
    pub fn dependencies(&self) -> &[RequestKey] {
        &self.dependencies
    }

    /// 使用已解析的依赖生产实例
    pub fn produce(&self, dependencies: &Dependencies) -> Result<AnyInstance, FactoryError> {
        (self.produce)(dependencies)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("produce", &"<function>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Battery(u8);

    #[derive(Debug)]
    struct RemoteControl {
        battery: Arc<Battery>,
    }

    #[test]
    fn test_with_dependency_factory() {
        let factory = Factory::with_dependency::<Battery, RemoteControl, _>(
            RequestKey::of::<Battery>(),
            |battery| RemoteControl { battery },
        );
        assert_eq!(factory.dependencies(), &[RequestKey::of::<Battery>()]);

        let deps = Dependencies::new(
            vec![RequestKey::of::<Battery>()],
            vec![Arc::new(Battery(80)) as AnyInstance],
        );
        let produced = factory.produce(&deps).unwrap();
        let remote = produced.downcast::<RemoteControl>().unwrap();
        assert_eq!(*remote.battery, Battery(80));
    }

    #[test]
    fn test_dependency_type_mismatch() {
        let deps = Dependencies::new(
            vec![RequestKey::of::<Battery>()],
            vec![Arc::new("not a battery".to_string()) as AnyInstance],
        );
        let error = deps.get::<Battery>(0).unwrap_err();
        assert!(matches!(error, ResolutionError::TypeMismatch { .. }));
        assert!(deps.get::<Battery>(3).is_err());
    }
}
