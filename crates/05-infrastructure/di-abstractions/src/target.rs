//! 注入目标与注入清单
//!
//! 每个注入目标类型有一份静态的 [`InjectionManifest`]，按声明类型分节列出注入点
//! 以及写入字段的类型化 setter。嵌入的基础结构体（相当于父类）各自占一节，
//! 扫描器据此决定哪些节需要遍历。

use crate::providers::ViewRoot;
use infrastructure_common::{
    AnyInstance, InjectionCategory, RequestKey, ResolutionError, TypeInfo,
};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// 字段写入函数
pub type FieldSetter<T> =
    Arc<dyn Fn(&mut T, AnyInstance) -> Result<(), ResolutionError> + Send + Sync>;

/// 注入目标
///
/// 通常由 `#[derive(Injectable)]` 实现；也可以手写 [`InjectionTarget::manifest`]。
pub trait InjectionTarget: Send + 'static {
    /// 类型的注入清单
    fn manifest() -> &'static InjectionManifest<Self>
    where
        Self: Sized;

    /// 当前视图层级根，没有内容视图的目标返回 `None`
    fn view_root(&self) -> Option<ViewRoot> {
        None
    }

    /// 所有注入点写入完成后调用
    fn on_injected(&mut self) {}
}

/// 注入点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// 声明该字段的类型
    pub declaring_type: TypeInfo,
    /// 字段名
    pub field: &'static str,
    /// 请求键
    pub key: RequestKey,
    /// 注入点类别
    pub category: InjectionCategory,
    /// 提供者报告不存在时是否跳过
    pub optional: bool,
}

impl InjectionPoint {
    /// 字段标识，形如 `MasterConsole::remote_control`
    pub fn site(&self) -> String {
        format!("{}::{}", self.declaring_type, self.field)
    }
}

/// 清单条目：注入点和对应的 setter
pub struct ManifestEntry<T> {
    point: InjectionPoint,
    field_type: TypeInfo,
    setter: FieldSetter<T>,
}

impl<T> ManifestEntry<T> {
    /// 注入点
    pub fn point(&self) -> &InjectionPoint {
        &self.point
    }

    /// 字段槽位的值类型
    pub fn field_type(&self) -> &TypeInfo {
        &self.field_type
    }

    /// 值能否写入该字段
    pub fn accepts(&self, value: &AnyInstance) -> bool {
        self.field_type.matches(value)
    }

    /// 将已解析的值写入目标字段
    pub fn apply(&self, target: &mut T, value: AnyInstance) -> Result<(), ResolutionError> {
        (self.setter)(target, value)
    }
}

impl<T> Clone for ManifestEntry<T> {
    fn clone(&self) -> Self {
        Self {
            point: self.point.clone(),
            field_type: self.field_type,
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<T> fmt::Debug for ManifestEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestEntry")
            .field("point", &self.point)
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

/// 清单中属于同一声明类型的一节
pub struct ManifestSection<T> {
    declaring_type: TypeInfo,
    entries: Vec<ManifestEntry<T>>,
}

impl<T> ManifestSection<T> {
    /// 声明类型
    pub fn declaring_type(&self) -> &TypeInfo {
        &self.declaring_type
    }

    /// 本节条目
    pub fn entries(&self) -> &[ManifestEntry<T>] {
        &self.entries
    }

    /// 本节是否声明了注入点
    pub fn has_points(&self) -> bool {
        !self.entries.is_empty()
    }
}

impl<T> fmt::Debug for ManifestSection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestSection")
            .field("declaring_type", &self.declaring_type)
            .field("entries", &self.entries)
            .finish()
    }
}

/// 注入清单
///
/// 第一节总是目标类型本身，随后是嵌入的基础类型（由近及远）。
pub struct InjectionManifest<T> {
    target: TypeInfo,
    sections: Vec<ManifestSection<T>>,
}

impl<T: 'static> InjectionManifest<T> {
    /// 创建清单构建器
    pub fn builder() -> ManifestBuilder<T> {
        ManifestBuilder::new()
    }

    /// 空清单
    pub fn empty() -> Self {
        ManifestBuilder::new().build()
    }
}

impl<T> InjectionManifest<T> {
    /// 目标类型
    pub fn target(&self) -> &TypeInfo {
        &self.target
    }

    /// 所有节
    pub fn sections(&self) -> &[ManifestSection<T>] {
        &self.sections
    }

    /// 所有注入点（不经过任何过滤）
    pub fn points(&self) -> impl Iterator<Item = &InjectionPoint> + '_ {
        self.sections
            .iter()
            .flat_map(|section| section.entries.iter().map(ManifestEntry::point))
    }

    /// 注入点总数
    pub fn len(&self) -> usize {
        self.sections.iter().map(|section| section.entries.len()).sum()
    }

    /// 是否没有注入点
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for InjectionManifest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionManifest")
            .field("target", &self.target)
            .field("sections", &self.sections)
            .finish()
    }
}

/// 清单构建器
pub struct ManifestBuilder<T> {
    target: TypeInfo,
    sections: Vec<ManifestSection<T>>,
}

impl<T: 'static> ManifestBuilder<T> {
    /// 创建构建器，当前节为目标类型本身
    pub fn new() -> Self {
        let target = TypeInfo::of::<T>();
        Self {
            target,
            sections: vec![ManifestSection {
                declaring_type: target,
                entries: Vec::new(),
            }],
        }
    }

    /// 开始新的一节，之后添加的注入点都算作类型 `D` 声明的
    #[must_use]
    pub fn section<D: ?Sized + 'static>(mut self) -> Self {
        self.sections.push(ManifestSection {
            declaring_type: TypeInfo::of::<D>(),
            entries: Vec::new(),
        });
        self
    }

    /// 添加注入点
    ///
    /// `write` 收到已向下转型为 `F` 的值；类型不符时返回 `TypeMismatch`。
    #[must_use]
    pub fn point<F, W>(
        mut self,
        field: &'static str,
        key: RequestKey,
        category: InjectionCategory,
        optional: bool,
        write: W,
    ) -> Self
    where
        F: Send + Sync + 'static,
        W: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
    {
        let expected = key.clone();
        let setter: FieldSetter<T> = Arc::new(move |target: &mut T, value: AnyInstance| {
            let value = value
                .downcast::<F>()
                .map_err(|other| ResolutionError::TypeMismatch {
                    key: expected.clone(),
                    actual: format!("{:?}", (*other).type_id()),
                })?;
            write(target, value);
            Ok(())
        });

        let declaring_type = self.current_section_type();
        self.push_entry(ManifestEntry {
            point: InjectionPoint {
                declaring_type,
                field,
                key,
                category,
                optional,
            },
            field_type: TypeInfo::of::<F>(),
            setter,
        });
        self
    }

    /// 添加普通值注入点
    #[must_use]
    pub fn value<F, W>(self, field: &'static str, key: RequestKey, write: W) -> Self
    where
        F: Send + Sync + 'static,
        W: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
    {
        self.point(field, key, InjectionCategory::Value, false, write)
    }

    /// 添加视图注入点
    #[must_use]
    pub fn view<F, W>(self, field: &'static str, key: RequestKey, write: W) -> Self
    where
        F: Send + Sync + 'static,
        W: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
    {
        self.point(field, key, InjectionCategory::View, false, write)
    }

    /// 添加资源 / extra 注入点
    #[must_use]
    pub fn resource<F, W>(self, field: &'static str, key: RequestKey, write: W) -> Self
    where
        F: Send + Sync + 'static,
        W: Fn(&mut T, Arc<F>) + Send + Sync + 'static,
    {
        self.point(field, key, InjectionCategory::Resource, false, write)
    }

    /// 嵌入基础类型的清单
    ///
    /// `B` 的各节原样追加到本清单之后，setter 经 `access` 写入嵌入的字段。
    #[must_use]
    pub fn embed<B>(mut self, access: fn(&mut T) -> &mut B) -> Self
    where
        B: InjectionTarget,
    {
        for section in B::manifest().sections() {
            let entries = section
                .entries()
                .iter()
                .map(|entry| {
                    let inner = Arc::clone(&entry.setter);
                    let setter: FieldSetter<T> =
                        Arc::new(move |target: &mut T, value: AnyInstance| {
                            inner(access(target), value)
                        });
                    ManifestEntry {
                        point: entry.point.clone(),
                        field_type: entry.field_type,
                        setter,
                    }
                })
                .collect();
            self.sections.push(ManifestSection {
                declaring_type: section.declaring_type,
                entries,
            });
        }
        self
    }

    /// 完成构建
    pub fn build(self) -> InjectionManifest<T> {
        InjectionManifest {
            target: self.target,
            sections: self.sections,
        }
    }

    fn current_section_type(&self) -> TypeInfo {
        self.sections
            .last()
            .map_or(self.target, |section| section.declaring_type)
    }

    fn push_entry(&mut self, entry: ManifestEntry<T>) {
        if let Some(section) = self.sections.last_mut() {
            section.entries.push(entry);
        }
    }
}

impl<T: 'static> Default for ManifestBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 可注入字段的槽位
///
/// 注入前为空；注入后解引用为 `T`。
pub struct Injected<T: ?Sized> {
    value: Option<Arc<T>>,
}

impl<T: ?Sized> Injected<T> {
    /// 空槽位
    pub const fn empty() -> Self {
        Self { value: None }
    }

    /// 写入值
    pub fn set(&mut self, value: Arc<T>) {
        self.value = Some(value);
    }

    /// 已注入的值
    pub fn get(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    /// 是否已注入
    pub fn is_injected(&self) -> bool {
        self.value.is_some()
    }

    /// 取出已注入的值
    pub fn take(&mut self) -> Option<Arc<T>> {
        self.value.take()
    }
}

impl<T: Send + Sync + 'static> Injected<T> {
    /// 从未转型的实例写入
    pub fn fill(&mut self, key: &RequestKey, value: AnyInstance) -> Result<(), ResolutionError> {
        let value = value
            .downcast::<T>()
            .map_err(|other| ResolutionError::TypeMismatch {
                key: key.clone(),
                actual: format!("{:?}", (*other).type_id()),
            })?;
        self.set(value);
        Ok(())
    }
}

impl<T: ?Sized> Default for Injected<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: ?Sized> Deref for Injected<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => &**value,
            None => panic!("字段尚未注入: {}", std::any::type_name::<T>()),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => f.debug_tuple("Injected").field(value).finish(),
            None => f.write_str("Injected(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    #[derive(Debug, Default)]
    struct RemoteControl;

    #[derive(Debug)]
    struct Button(&'static str);

    #[derive(Default)]
    struct ConsoleBase {
        status: Injected<String>,
    }

    impl InjectionTarget for ConsoleBase {
        fn manifest() -> &'static InjectionManifest<Self> {
            static MANIFEST: Lazy<InjectionManifest<ConsoleBase>> = Lazy::new(|| {
                InjectionManifest::builder()
                    .resource::<String, _>(
                        "status",
                        RequestKey::with_type_id::<String>(17),
                        |target: &mut ConsoleBase, value| target.status.set(value),
                    )
                    .build()
            });
            &MANIFEST
        }
    }

    #[derive(Default)]
    struct Console {
        base: ConsoleBase,
        remote: Injected<RemoteControl>,
        fight_evil: Injected<Button>,
    }

    impl InjectionTarget for Console {
        fn manifest() -> &'static InjectionManifest<Self> {
            static MANIFEST: Lazy<InjectionManifest<Console>> = Lazy::new(|| {
                InjectionManifest::builder()
                    .value::<RemoteControl, _>(
                        "remote",
                        RequestKey::constructible::<RemoteControl>(),
                        |target: &mut Console, value| target.remote.set(value),
                    )
                    .view::<Button, _>(
                        "fight_evil",
                        RequestKey::named::<Button>("fightevil"),
                        |target: &mut Console, value| target.fight_evil.set(value),
                    )
                    .embed(|target: &mut Console| &mut target.base)
                    .build()
            });
            &MANIFEST
        }
    }

    #[test]
    fn test_manifest_sections() {
        let manifest = Console::manifest();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.sections().len(), 2);
        assert_eq!(manifest.sections()[0].declaring_type(), &TypeInfo::of::<Console>());
        assert_eq!(manifest.sections()[1].declaring_type(), &TypeInfo::of::<ConsoleBase>());

        let sites: Vec<_> = manifest.points().map(InjectionPoint::site).collect();
        assert_eq!(
            sites,
            vec!["Console::remote", "Console::fight_evil", "ConsoleBase::status"]
        );
    }

    #[test]
    fn test_embedded_setter_writes_base_field() {
        let mut console = Console::default();
        let entry = &Console::manifest().sections()[1].entries()[0];
        entry
            .apply(&mut console, Arc::new("online".to_string()))
            .unwrap();
        assert_eq!(console.base.status.as_str(), "online");
    }

    #[test]
    fn test_setter_rejects_wrong_type() {
        let mut console = Console::default();
        let entry = &Console::manifest().sections()[0].entries()[1];
        let error = entry
            .apply(&mut console, Arc::new(RemoteControl))
            .unwrap_err();
        assert!(matches!(error, ResolutionError::TypeMismatch { .. }));
        assert!(!console.fight_evil.is_injected());

        entry
            .apply(&mut console, Arc::new(Button("fightevil")))
            .unwrap();
        assert_eq!(console.fight_evil.0, "fightevil");
    }

    #[test]
    fn test_injected_fill() {
        let mut slot: Injected<RemoteControl> = Injected::default();
        assert!(!slot.is_injected());
        slot.fill(&RequestKey::of::<RemoteControl>(), Arc::new(RemoteControl))
            .unwrap();
        assert!(slot.is_injected());
        assert!(slot
            .fill(&RequestKey::of::<RemoteControl>(), Arc::new(3_u8))
            .is_err());
    }

    #[test]
    #[should_panic(expected = "字段尚未注入")]
    fn test_deref_empty_panics() {
        let slot: Injected<String> = Injected::empty();
        let _ = slot.len();
    }
}
