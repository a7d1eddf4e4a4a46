//! 宏工具函数

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Field, Ident, Lit, Meta, Result, Token, Type, UnOp};

/// 属性参数：名称与可选的字面量值
pub type AttributeArgs = Vec<(Ident, Option<Lit>)>;

/// 解析属性参数
///
/// `#[inject]` 没有参数；`#[inject(default, named = "x")]` 解析为两项。
pub fn parse_attribute_args(attr: &Attribute) -> Result<AttributeArgs> {
    let metas = match &attr.meta {
        Meta::Path(_) => return Ok(Vec::new()),
        Meta::List(_) => attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?,
        Meta::NameValue(nv) => {
            return Err(syn::Error::new_spanned(nv, "请使用 #[attr(key = value)] 形式"));
        }
    };

    let mut parsed_args = Vec::new();
    for meta in metas {
        match meta {
            Meta::Path(path) => {
                let ident = path
                    .get_ident()
                    .cloned()
                    .ok_or_else(|| syn::Error::new_spanned(&path, "参数名必须是标识符"))?;
                parsed_args.push((ident, None));
            }
            Meta::NameValue(nv) => {
                let ident = nv
                    .path
                    .get_ident()
                    .cloned()
                    .ok_or_else(|| syn::Error::new_spanned(&nv.path, "参数名必须是标识符"))?;
                let value = literal_of(&nv.value)
                    .ok_or_else(|| syn::Error::new_spanned(&nv.value, "参数值必须是字面量"))?;
                parsed_args.push((ident, Some(value)));
            }
            Meta::List(list) => {
                return Err(syn::Error::new_spanned(list, "不支持嵌套参数"));
            }
        }
    }

    Ok(parsed_args)
}

fn literal_of(expr: &Expr) -> Option<Lit> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => Some(lit.clone()),
        // 负数 id
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match literal_of(expr)? {
            Lit::Int(lit_int) => Some(Lit::Int(syn::LitInt::new(
                &format!("-{}", lit_int.base10_digits()),
                lit_int.span(),
            ))),
            _ => None,
        },
        _ => None,
    }
}

/// 读取字符串参数值
pub fn expect_str(name: &Ident, value: Option<&Lit>) -> Result<String> {
    match value {
        Some(Lit::Str(lit_str)) => {
            let value = lit_str.value();
            if value.trim().is_empty() {
                Err(syn::Error::new_spanned(lit_str, format!("`{name}` 不能为空")))
            } else {
                Ok(value)
            }
        }
        Some(other) => Err(syn::Error::new_spanned(other, format!("`{name}` 需要字符串"))),
        None => Err(syn::Error::new_spanned(name, format!("`{name}` 需要一个值"))),
    }
}

/// 读取整数参数值
pub fn expect_int(name: &Ident, value: Option<&Lit>) -> Result<i64> {
    match value {
        Some(Lit::Int(lit_int)) => lit_int.base10_parse(),
        Some(other) => Err(syn::Error::new_spanned(other, format!("`{name}` 需要整数"))),
        None => Err(syn::Error::new_spanned(name, format!("`{name}` 需要一个值"))),
    }
}

/// 从 `Injected<T>` 中提取 `T`
pub fn extract_injected_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Injected" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner_type)) => Some(inner_type),
            _ => None,
        },
        _ => None,
    }
}

/// 生成字段访问器函数名
pub fn generate_accessor_name(field_name: &str, prefix: &str) -> Ident {
    let accessor_name = format!("__{}_{}", prefix, field_name);
    Ident::new(&accessor_name, Span::call_site())
}

/// 检查字段是否有特定属性
pub fn field_has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}
