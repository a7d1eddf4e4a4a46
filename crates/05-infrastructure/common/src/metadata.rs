//! 元数据定义
//!
//! 提供类型标识信息。类型标识可以携带一个零参构造器，相当于"该类型可以被默认构造"。

use crate::AnyInstance;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 零参构造器
pub type Constructor = fn() -> AnyInstance;

/// 类型信息
///
/// 相等性与哈希只取决于 [`TypeId`]，构造器不参与比较。
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    constructor: Option<Constructor>,
}

impl TypeInfo {
    /// 从类型获取类型信息（不可默认构造）
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            constructor: None,
        }
    }

    /// 从实现了 `Default` 的类型获取类型信息，附带默认构造器
    pub fn constructible<T>() -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        Self {
            constructor: Some(construct_default::<T>),
            ..Self::of::<T>()
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径与泛型参数）
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// 是否可以默认构造
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// 尝试默认构造一个实例
    pub fn construct(&self) -> Option<AnyInstance> {
        self.constructor.map(|constructor| constructor())
    }

    /// 判断实例的具体类型是否就是该类型
    pub fn matches(&self, instance: &AnyInstance) -> bool {
        (**instance).type_id() == self.id
    }
}

fn construct_default<T>() -> AnyInstance
where
    T: Default + Send + Sync + 'static,
{
    Arc::new(T::default())
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("constructible", &self.is_constructible())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
