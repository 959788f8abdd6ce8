//! Derive macros for `nimble-sql`.
//!
//! - `#[derive(Entity)]` describes a struct's fields and generates its
//!   `get_<field>` / `set_<field>` members
//! - `#[derive(SqlEnum)]` stores a unit-only enum by variant name

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Entity, attributes(nimble))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(SqlEnum)]
pub fn derive_sql_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_sql_enum(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct EntityOptions {
    table: Option<String>,
}

#[derive(Default)]
struct FieldOptions {
    column: Option<String>,
    id: bool,
    generated: bool,
    ignore: bool,
}

struct EntityField {
    ident: Ident,
    ty: Type,
    options: FieldOptions,
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(Entity)] does not support generic types",
        ));
    }

    let struct_ident = input.ident.clone();
    let type_name = struct_ident.to_string();
    let options = parse_entity_options(&input.attrs)?;
    let fields = collect_fields(&input)?;

    let table = match &options.table {
        Some(table) => quote!(::core::option::Option::Some(#table)),
        None => quote!(::core::option::Option::None),
    };

    let field_members = fields.iter().map(field_member);

    let mut methods = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    for field in fields.iter().filter(|f| !f.options.ignore) {
        let ident = &field.ident;
        let ty = &field.ty;
        let getter = format!("get_{ident}");
        let setter = format!("set_{ident}");

        methods.push(quote! {
            ::nimble_sql::meta::Member::getter(#getter, <#ty as ::nimble_sql::SqlType>::VALUE_TYPE)
        });
        methods.push(quote! {
            ::nimble_sql::meta::Member::setter(#setter, <#ty as ::nimble_sql::SqlType>::VALUE_TYPE)
        });
        getters.push(quote! {
            #getter => ::core::option::Option::Some(
                ::nimble_sql::SqlType::into_value(::core::clone::Clone::clone(&self.#ident)),
            ),
        });
        setters.push(quote! {
            #setter => {
                self.#ident = <#ty as ::nimble_sql::SqlType>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    Ok(quote! {
        impl ::nimble_sql::meta::Entity for #struct_ident {
            fn meta() -> &'static ::nimble_sql::meta::EntityMeta {
                static META: ::nimble_sql::meta::EntityMeta = ::nimble_sql::meta::EntityMeta {
                    type_name: #type_name,
                    table: #table,
                    fields: &[#(#field_members),*],
                    methods: &[#(#methods),*],
                };
                &META
            }
        }

        impl ::nimble_sql::meta::Accessible for #struct_ident {
            fn entity_meta(&self) -> &'static ::nimble_sql::meta::EntityMeta {
                <Self as ::nimble_sql::meta::Entity>::meta()
            }

            fn get(&self, accessor: &str) -> ::core::option::Option<::nimble_sql::Value> {
                match accessor {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set(
                &mut self,
                mutator: &str,
                value: ::nimble_sql::Value,
            ) -> ::core::result::Result<(), ::nimble_sql::NimbleError> {
                match mutator {
                    #(#setters)*
                    _ => ::core::result::Result::Err(
                        <Self as ::nimble_sql::meta::Entity>::meta().unknown_member(mutator),
                    ),
                }
            }
        }
    })
}

fn field_member(field: &EntityField) -> TokenStream2 {
    let name = field.ident.to_string();
    let ty = &field.ty;
    if field.options.ignore {
        return quote! {
            ::nimble_sql::meta::Member::field(#name, ::nimble_sql::ValueType::Any).with_ignore()
        };
    }

    let mut member = quote! {
        ::nimble_sql::meta::Member::field(#name, <#ty as ::nimble_sql::SqlType>::VALUE_TYPE)
    };
    if let Some(column) = &field.options.column {
        member = quote!(#member.with_column(#column));
    }
    if field.options.generated {
        member = quote!(#member.with_generated_id());
    } else if field.options.id {
        member = quote!(#member.with_id());
    }
    member
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<EntityField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(Entity)] can only be used on structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "#[derive(Entity)] requires named fields",
        ));
    };

    named
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
            Ok(EntityField {
                ident,
                ty: field.ty.clone(),
                options: parse_field_options(&field.attrs)?,
            })
        })
        .collect()
}

fn parse_entity_options(attrs: &[syn::Attribute]) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("nimble")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                options.table = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("unsupported #[nimble(...)] option on a struct. Supported: table = \"...\""))
        })?;
    }
    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("nimble")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                options.column = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("id") {
                options.id = true;
                if meta.input.peek(syn::token::Paren) {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("generated") {
                            options.generated = true;
                            return Ok(());
                        }
                        Err(inner.error("unsupported id option. Supported: generated"))
                    })?;
                }
                return Ok(());
            }

            if meta.path.is_ident("ignore") {
                options.ignore = true;
                return Ok(());
            }

            Err(meta.error(
                "unsupported #[nimble(...)] option on a field. Supported: column = \"...\", id, id(generated), ignore",
            ))
        })?;
    }

    if options.ignore && (options.id || options.column.is_some()) {
        return Err(syn::Error::new(
            attrs
                .iter()
                .find(|a| a.path().is_ident("nimble"))
                .map_or_else(proc_macro2::Span::call_site, |a| a.span()),
            "an ignored field can't also be an id or carry a column",
        ));
    }
    Ok(options)
}

fn expand_sql_enum(input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(SqlEnum)] can only be used on enums",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(SqlEnum)] does not support generic types",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(SqlEnum)] needs at least one variant",
        ));
    }

    let enum_ident = &input.ident;
    let type_name = enum_ident.to_string();
    let mut variant_idents = Vec::new();
    let mut variant_names = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "#[derive(SqlEnum)] only supports unit variants",
            ));
        }
        variant_idents.push(variant.ident.clone());
        variant_names.push(variant.ident.to_string());
    }

    Ok(quote! {
        impl ::nimble_sql::types::SqlEnum for #enum_ident {
            const ENUM_TYPE: ::nimble_sql::types::EnumType = ::nimble_sql::types::EnumType {
                name: #type_name,
                variants: &[#(#variant_names),*],
            };

            fn variant_name(&self) -> &'static str {
                match self {
                    #(Self::#variant_idents => #variant_names,)*
                }
            }

            fn from_variant_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#variant_names => ::core::option::Option::Some(Self::#variant_idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::nimble_sql::SqlType for #enum_ident {
            const VALUE_TYPE: ::nimble_sql::ValueType = ::nimble_sql::ValueType::Enum(
                <Self as ::nimble_sql::types::SqlEnum>::ENUM_TYPE,
            );

            fn into_value(self) -> ::nimble_sql::Value {
                ::nimble_sql::types::enum_into_value(&self)
            }

            fn from_value(
                value: ::nimble_sql::Value,
            ) -> ::core::result::Result<Self, ::nimble_sql::NimbleError> {
                ::nimble_sql::types::enum_from_value(value)
            }
        }

        impl ::core::convert::From<#enum_ident> for ::nimble_sql::Value {
            fn from(value: #enum_ident) -> Self {
                ::nimble_sql::types::enum_into_value(&value)
            }
        }
    })
}
