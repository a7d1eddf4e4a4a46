//! 内存中的视图层级

use di_abstractions::{ViewProvider, ViewRoot};
use infrastructure_common::{AnyInstance, Qualifier, RequestKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// 自毁按钮的视图 id
pub const SELF_DESTRUCT_ID: i64 = 1;
/// 说话输入框的视图 id
pub const SAY_TEXT_ID: i64 = 2;
/// 刷牙按钮的视图 id
pub const BRUSH_TEETH_ID: i64 = 3;
/// 打击邪恶势力按钮的标签
pub const FIGHT_EVIL_TAG: &str = "fightevil";

/// 按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// 显示文字
    pub text: String,
}

impl Button {
    /// 创建按钮
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 单行输入框
#[derive(Debug, Default)]
pub struct TextField {
    text: Mutex<String>,
}

impl TextField {
    /// 输入文字
    pub fn type_text(&self, text: &str) {
        self.text.lock().push_str(text);
    }

    /// 当前文字
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// 取出文字并清空
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.text.lock())
    }
}

/// 文本标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(pub String);

/// 视图层级
///
/// 每个内容视图（根）下按标签保存子视图；数字 id 查找时按 `#id` 形式的标签匹配。
#[derive(Default)]
pub struct ViewHierarchy {
    roots: HashMap<String, HashMap<String, AnyInstance>>,
}

impl ViewHierarchy {
    /// 创建空层级
    pub fn new() -> Self {
        Self::default()
    }

    /// 遥控台用到的内容视图
    ///
    /// `hello` 是精简布局，没有打击邪恶势力按钮。
    pub fn astroboy() -> Self {
        let mut hierarchy = Self::new();
        for root in ["console", "hello"] {
            hierarchy = hierarchy
                .with_id(root, SELF_DESTRUCT_ID, Button::new("自毁"))
                .with_id(root, SAY_TEXT_ID, TextField::default())
                .with_id(root, BRUSH_TEETH_ID, Button::new("刷牙"));
        }
        hierarchy
            .with_view("console", FIGHT_EVIL_TAG, Button::new("打击邪恶势力"))
            .with_view("fight", "expletive", Label("邪恶势力退散!".to_string()))
    }

    /// 按数字 id 添加视图
    #[must_use]
    pub fn with_id<V: Send + Sync + 'static>(self, root: &str, id: i64, view: V) -> Self {
        self.with_view(root, &format!("#{id}"), view)
    }

    /// 按标签添加视图
    #[must_use]
    pub fn with_view<V: Send + Sync + 'static>(mut self, root: &str, tag: &str, view: V) -> Self {
        self.roots
            .entry(root.to_string())
            .or_default()
            .insert(tag.to_string(), Arc::new(view));
        self
    }
}

impl ViewProvider for ViewHierarchy {
    fn find_view(&self, root: &ViewRoot, key: &RequestKey) -> Option<AnyInstance> {
        let tag = match key.qualifier()? {
            Qualifier::Name(tag) => tag.clone(),
            Qualifier::Id(id) => format!("#{id}"),
        };
        self.roots.get(root.name())?.get(&tag).cloned()
    }
}
