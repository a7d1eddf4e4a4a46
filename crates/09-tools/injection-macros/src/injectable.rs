//! `#[derive(Injectable)]` 实现

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, Result, Type};

use crate::utils::{
    expect_int, expect_str, extract_injected_type, field_has_attribute, generate_accessor_name,
    parse_attribute_args,
};

/// 注入点类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Value,
    View,
    Resource,
}

/// 请求键的构造方式
#[derive(Debug, Clone)]
enum KeySpec {
    Plain,
    Constructible,
    Named(String),
    Id(i64),
}

/// 单个注入字段
struct PointSpec {
    field: Ident,
    inner: Type,
    category: Category,
    key: KeySpec,
    optional: bool,
}

/// 嵌入的基础结构体字段
struct BaseSpec {
    field: Ident,
    ty: Type,
}

/// 结构体级参数
#[derive(Default)]
struct TargetArgs {
    view_root: Option<Ident>,
    on_injected: Option<Ident>,
}

/// 实现 #[derive(Injectable)] 宏
pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Injectable 不支持泛型结构体（注入清单是静态的）",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "Injectable 只支持具名字段的结构体",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Injectable 只能用于结构体",
            ));
        }
    };

    let args = parse_target_args(&input)?;

    let mut points = Vec::new();
    let mut bases = Vec::new();
    for field in fields {
        if let Some(point) = parse_point(field)? {
            points.push(point);
        } else if field_has_attribute(field, "inject_base") {
            bases.push(BaseSpec {
                field: field_ident(field)?,
                ty: field.ty.clone(),
            });
        }
    }

    // 自身的注入点必须在嵌入节之前添加
    let point_calls = points.iter().map(|point| generate_point(struct_name, point));
    let accessors = bases.iter().map(|base| {
        let accessor = generate_accessor_name(&base.field.to_string(), "embed");
        let field = &base.field;
        let ty = &base.ty;
        quote! {
            fn #accessor(target: &mut #struct_name) -> &mut #ty {
                &mut target.#field
            }
        }
    });
    let embed_calls = bases.iter().map(|base| {
        let accessor = generate_accessor_name(&base.field.to_string(), "embed");
        let ty = &base.ty;
        quote! { .embed::<#ty>(#accessor) }
    });

    let view_root = args.view_root.map(|method| {
        quote! {
            fn view_root(&self) -> ::core::option::Option<::di_abstractions::ViewRoot> {
                self.#method()
            }
        }
    });
    let on_injected = args.on_injected.map(|method| {
        quote! {
            fn on_injected(&mut self) {
                self.#method();
            }
        }
    });

    Ok(quote! {
        impl ::di_abstractions::InjectionTarget for #struct_name {
            fn manifest() -> &'static ::di_abstractions::InjectionManifest<Self> {
                #(#accessors)*

                static MANIFEST: ::di_abstractions::__private::Lazy<
                    ::di_abstractions::InjectionManifest<#struct_name>,
                > = ::di_abstractions::__private::Lazy::new(|| {
                    ::di_abstractions::InjectionManifest::<#struct_name>::builder()
                        #(#point_calls)*
                        #(#embed_calls)*
                        .build()
                });
                &MANIFEST
            }

            #view_root

            #on_injected
        }
    })
}

fn parse_target_args(input: &DeriveInput) -> Result<TargetArgs> {
    let mut args = TargetArgs::default();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
        for (name, value) in parse_attribute_args(attr)? {
            let method = Ident::new(&expect_str(&name, value.as_ref())?, name.span());
            if name == "view_root" {
                args.view_root = Some(method);
            } else if name == "on_injected" {
                args.on_injected = Some(method);
            } else {
                return Err(syn::Error::new_spanned(
                    &name,
                    "未知参数，可用参数: view_root, on_injected",
                ));
            }
        }
    }
    Ok(args)
}

fn parse_point(field: &Field) -> Result<Option<PointSpec>> {
    let mut found: Option<PointSpec> = None;

    for attr in &field.attrs {
        let category = if attr.path().is_ident("inject") {
            Category::Value
        } else if attr.path().is_ident("inject_view") {
            Category::View
        } else if attr.path().is_ident("inject_resource") || attr.path().is_ident("inject_extra") {
            Category::Resource
        } else {
            continue;
        };

        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "每个字段只能有一个注入属性"));
        }

        let inner = extract_injected_type(&field.ty).cloned().ok_or_else(|| {
            syn::Error::new_spanned(&field.ty, "注入字段的类型必须是 Injected<T>")
        })?;

        let mut key = KeySpec::Plain;
        let mut optional = false;
        for (name, value) in parse_attribute_args(attr)? {
            let value = value.as_ref();
            let allowed = match category {
                Category::Value => ["default", "named", "id", "optional"].as_slice(),
                Category::View => ["id", "tag", "optional"].as_slice(),
                Category::Resource if attr.path().is_ident("inject_extra") => {
                    ["name", "optional"].as_slice()
                }
                Category::Resource => ["id", "optional"].as_slice(),
            };
            if !allowed.iter().any(|allowed| name == allowed) {
                return Err(syn::Error::new_spanned(
                    &name,
                    format!("未知参数，可用参数: {}", allowed.join(", ")),
                ));
            }

            if name == "optional" {
                optional = true;
            } else if name == "default" {
                key = KeySpec::Constructible;
            } else if name == "id" {
                key = KeySpec::Id(expect_int(&name, value)?);
            } else {
                key = KeySpec::Named(expect_str(&name, value)?);
            }
        }

        let qualified = !matches!(key, KeySpec::Plain | KeySpec::Constructible);
        if category != Category::Value && !qualified {
            return Err(syn::Error::new_spanned(
                attr,
                "视图和资源注入点需要 id、tag 或 name",
            ));
        }

        found = Some(PointSpec {
            field: field_ident(field)?,
            inner,
            category,
            key,
            optional,
        });
    }

    Ok(found)
}

fn field_ident(field: &Field) -> Result<Ident> {
    field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "字段必须具名"))
}

fn generate_point(struct_name: &Ident, point: &PointSpec) -> TokenStream {
    let field = &point.field;
    let field_name = field.to_string();
    let inner = &point.inner;
    let optional = point.optional;

    let key = match &point.key {
        KeySpec::Plain => quote! {
            ::di_abstractions::__private::common::RequestKey::of::<#inner>()
        },
        KeySpec::Constructible => quote! {
            ::di_abstractions::__private::common::RequestKey::constructible::<#inner>()
        },
        KeySpec::Named(name) => quote! {
            ::di_abstractions::__private::common::RequestKey::named::<#inner>(#name)
        },
        KeySpec::Id(id) => quote! {
            ::di_abstractions::__private::common::RequestKey::with_type_id::<#inner>(#id)
        },
    };
    let category = match point.category {
        Category::Value => quote! { ::di_abstractions::__private::common::InjectionCategory::Value },
        Category::View => quote! { ::di_abstractions::__private::common::InjectionCategory::View },
        Category::Resource => {
            quote! { ::di_abstractions::__private::common::InjectionCategory::Resource }
        }
    };

    quote! {
        .point::<#inner, _>(
            #field_name,
            #key,
            #category,
            #optional,
            |target: &mut #struct_name, value| target.#field.set(value),
        )
    }
}
