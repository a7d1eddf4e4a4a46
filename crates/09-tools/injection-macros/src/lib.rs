//! # Injection Macros
//!
//! 这个 crate 提供了为注入目标生成静态注入清单的派生宏。
//!
//! ## 核心宏
//!
//! - [`Injectable`] - 为结构体实现 `InjectionTarget`
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_abstractions::{Injected, ViewRoot};
//! use injection_macros::Injectable;
//!
//! #[derive(Default, Injectable)]
//! #[injectable(view_root = "current_view")]
//! pub struct MasterConsole {
//!     #[inject(default)]
//!     remote_control: Injected<AstroboyRemoteControl>,
//!     #[inject]
//!     vibrator: Injected<Vibrator>,
//!     #[inject_view(tag = "fightevil")]
//!     fight_evil: Injected<ClickHandler>,
//!     #[inject_base]
//!     base: ConsoleBase,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod utils;

/// 注入目标派生宏
///
/// 自动生成 `InjectionTarget` 实现和静态注入清单。注入字段必须是 `Injected<T>`。
///
/// # 字段属性
///
/// - `#[inject]` - 从容器解析 `T`
/// - `#[inject(default)]` - 没有绑定时默认构造 `T`
/// - `#[inject(named = "x")]` / `#[inject(id = N)]` - 带限定符解析
/// - `#[inject_view(id = N)]` / `#[inject_view(tag = "x")]` - 在视图层级中查找
/// - `#[inject_resource(id = N)]` - 查找资源
/// - `#[inject_extra(name = "x")]` - 查找宿主传入的命名 extra
/// - `#[inject_base]` - 嵌入的基础结构体，其清单追加在本类型之后
///
/// 以上注入属性都可以附加 `optional`，提供者报告不存在时跳过该字段。
///
/// # 结构体属性
///
/// - `#[injectable(view_root = "method")]` - 返回 `Option<ViewRoot>` 的方法
/// - `#[injectable(on_injected = "method")]` - 注入完成后调用的 `&mut self` 方法
#[proc_macro_derive(
    Injectable,
    attributes(injectable, inject, inject_view, inject_resource, inject_extra, inject_base)
)]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
