//! 注入请求键
//!
//! 请求键由类型标识和可选限定符组成，是绑定注册表的查找键，
//! 也用来描述视图查找（视图 id / tag）和资源查找（资源 id / extra 名称）。

use crate::metadata::TypeInfo;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 限定符
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    /// 名称限定（也用作视图 tag 与 extra 名称）
    Name(String),
    /// 数字 id 限定（视图 id、资源 id）
    Id(i64),
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "@{name}"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// 请求键
///
/// 不可变；相等性由 `(类型, 限定符)` 决定。
#[derive(Debug, Clone)]
pub struct RequestKey {
    type_info: TypeInfo,
    qualifier: Option<Qualifier>,
}

impl RequestKey {
    /// 使用类型信息创建请求键
    pub fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            qualifier: None,
        }
    }

    /// 指定类型的请求键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }

    /// 指定类型的请求键，找不到绑定时允许默认构造
    pub fn constructible<T>() -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        Self::new(TypeInfo::constructible::<T>())
    }

    /// 指定类型和名称的请求键
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::of::<T>().with_name(name)
    }

    /// 指定类型和数字 id 的请求键
    pub fn with_type_id<T: ?Sized + 'static>(id: i64) -> Self {
        Self::of::<T>().with_id(id)
    }

    /// 附加名称限定符
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.qualifier = Some(Qualifier::Name(name.into()));
        self
    }

    /// 附加数字 id 限定符
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.qualifier = Some(Qualifier::Id(id));
        self
    }

    /// 类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_info.id()
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// 名称限定符（如果有）
    pub fn name(&self) -> Option<&str> {
        match &self.qualifier {
            Some(Qualifier::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// 数字 id 限定符（如果有）
    pub fn id(&self) -> Option<i64> {
        match self.qualifier {
            Some(Qualifier::Id(id)) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_info == other.type_info && self.qualifier == other.qualifier
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_info.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_info)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier}")?;
        }
        Ok(())
    }
}

/// 注入点类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectionCategory {
    /// 普通值，经由容器解析
    Value,
    /// 视图，经由视图提供者在目标的视图层级中查找
    View,
    /// 资源或 extra，经由资源提供者查找
    Resource,
}

impl fmt::Display for InjectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Value => "value",
            Self::View => "view",
            Self::Resource => "resource",
        };
        f.write_str(label)
    }
}
