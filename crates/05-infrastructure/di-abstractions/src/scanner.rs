//! 注入点扫描抽象
//!
//! 扫描器沿注入清单的各节（目标类型及其嵌入的基础类型）枚举注入点。
//! 配置了白名单时只遍历名单内的声明类型；名单外的节即使声明了注入点也会被跳过，
//! 这是有意保留的取舍，只通过诊断事件可见。

use crate::target::{InjectionManifest, InjectionTarget, ManifestEntry, ManifestSection};
use infrastructure_common::{ConfigurationError, TypeInfo};
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

/// 扫描模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// 完整遍历（较慢但完整）
    Unrestricted,
    /// 仅遍历白名单内的类型
    Restricted,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("unrestricted"),
            Self::Restricted => f.write_str("restricted"),
        }
    }
}

/// 遍历过滤器
pub trait TraversalFilter: Send + Sync {
    /// 该声明类型是否值得扫描
    fn is_worth_scanning(&self, declaring_type: &TypeInfo) -> bool;

    /// 扫描模式
    fn mode(&self) -> ScanMode;
}

/// 不做限制的过滤器
#[derive(Debug, Default, Clone, Copy)]
pub struct UnrestrictedFilter;

impl TraversalFilter for UnrestrictedFilter {
    fn is_worth_scanning(&self, _declaring_type: &TypeInfo) -> bool {
        true
    }

    fn mode(&self) -> ScanMode {
        ScanMode::Unrestricted
    }
}

/// 扫描白名单
///
/// 可以按类型或按类型名称登记；名称既可以是完整路径，也可以是简短名称。
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    types: HashSet<TypeId>,
    names: HashSet<String>,
}

impl AllowList {
    /// 创建空白名单
    pub fn new() -> Self {
        Self::default()
    }

    /// 从类型名称构建白名单，空白名称视为配置错误
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allow_list = Self::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(ConfigurationError::invalid_allow_list(format!(
                    "第 {} 项为空白名称",
                    index + 1
                )));
            }
            allow_list.names.insert(name.to_string());
        }
        Ok(allow_list)
    }

    /// 登记类型
    #[must_use]
    pub fn with<T: ?Sized + 'static>(mut self) -> Self {
        self.types.insert(TypeId::of::<T>());
        self
    }

    /// 登记类型名称
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// 是否包含该类型
    pub fn contains(&self, type_info: &TypeInfo) -> bool {
        self.types.contains(&type_info.id())
            || self.names.contains(type_info.name())
            || self.names.contains(type_info.short_name())
    }

    /// 登记项数量
    pub fn len(&self) -> usize {
        self.types.len() + self.names.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 基于白名单的过滤器
#[derive(Debug, Clone)]
pub struct AllowListFilter {
    allow_list: AllowList,
}

impl AllowListFilter {
    /// 创建过滤器
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    /// 白名单
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

impl TraversalFilter for AllowListFilter {
    fn is_worth_scanning(&self, declaring_type: &TypeInfo) -> bool {
        self.allow_list.contains(declaring_type)
    }

    fn mode(&self) -> ScanMode {
        ScanMode::Restricted
    }
}

/// 一次扫描的结果
///
/// 惰性、有限、可重新开始（克隆后从头遍历）。
pub struct Scan<'a, T> {
    sections: &'a [ManifestSection<T>],
    filter: &'a dyn TraversalFilter,
    section: usize,
    entry: usize,
}

impl<'a, T> Scan<'a, T> {
    /// 在清单上创建扫描
    pub fn new(manifest: &'a InjectionManifest<T>, filter: &'a dyn TraversalFilter) -> Self {
        Self {
            sections: manifest.sections(),
            filter,
            section: 0,
            entry: 0,
        }
    }

    /// 扫描模式
    pub fn mode(&self) -> ScanMode {
        self.filter.mode()
    }

    /// 被过滤器跳过且声明了注入点的节
    pub fn omitted_sections(&self) -> impl Iterator<Item = &'a ManifestSection<T>> + '_ {
        self.sections.iter().filter(move |section| {
            section.has_points() && !self.filter.is_worth_scanning(section.declaring_type())
        })
    }
}

impl<'a, T> Clone for Scan<'a, T> {
    fn clone(&self) -> Self {
        Self {
            sections: self.sections,
            filter: self.filter,
            section: self.section,
            entry: self.entry,
        }
    }
}

impl<'a, T> Iterator for Scan<'a, T> {
    type Item = &'a ManifestEntry<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(section) = self.sections.get(self.section) {
            if self.entry == 0 && !self.filter.is_worth_scanning(section.declaring_type()) {
                self.section += 1;
                continue;
            }
            if let Some(entry) = section.entries().get(self.entry) {
                self.entry += 1;
                return Some(entry);
            }
            self.section += 1;
            self.entry = 0;
        }
        None
    }
}

impl<'a, T> fmt::Debug for Scan<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("mode", &self.filter.mode())
            .field("section", &self.section)
            .field("entry", &self.entry)
            .finish()
    }
}

/// 注入点扫描器
pub trait InjectionScanner: Send + Sync {
    /// 当前使用的遍历过滤器
    fn filter(&self) -> &dyn TraversalFilter;

    /// 扫描目标的注入点；被跳过且声明了注入点的节会报告给诊断出口
    fn scan<'a, T: InjectionTarget>(&'a self, target: &T) -> Scan<'a, T>
    where
        Self: Sized;
}
