//! # Entity Derive Macro Implementation
//!
//! Expands `#[derive(Entity)]`. Attributes are parsed into a [`FieldMapping`]
//! per field, which then drives four generated pieces:
//!
//! 1. `table_mapping()` from the struct-level `#[corm(..)]` attribute.
//! 2. `columns()`, one `ColumnMapping` per mapped field.
//! 3. `setters()`, one `SetterMapping` per mapped field that is not derived.
//! 4. `get_value` / `set_value`, dispatching on the property name.

use std::collections::HashSet;

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr};

use crate::types::{property_type, property_type_named};

#[derive(Default)]
struct TableAttrs {
    table: Option<String>,
    title: String,
    description: String,
}

struct FieldMapping<'a> {
    ident: &'a Ident,
    property: String,
    column: String,
    property_type: TokenStream,
    primary_key: bool,
    auto_generated: bool,
    read_only: bool,
    listed: bool,
    label: String,
    sort: TokenStream,
    foreign_key: Option<(String, String)>,
    derived: bool,
}

pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Entity must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Entity must be a struct")),
    };

    let table = parse_table_attrs(&ast)?;
    let mut mappings = Vec::new();
    for field in fields {
        if let Some(mapping) = parse_field(field)? {
            mappings.push(mapping);
        }
    }

    let Some(table_name) = &table.table else {
        return Err(syn::Error::new_spanned(struct_name, "Entity requires #[corm(table = \"...\")]"));
    };
    let title = &table.title;
    let description = &table.description;

    let mut seen = HashSet::new();
    for mapping in &mappings {
        if !seen.insert(mapping.column.as_str()) {
            return Err(syn::Error::new_spanned(
                mapping.ident,
                format!("column `{}` is mapped more than once", mapping.column),
            ));
        }
    }

    let column_defs = mappings.iter().map(column_tokens);

    let setter_defs = mappings.iter().filter(|mapping| !mapping.derived).map(|mapping| {
        let property = &mapping.property;
        let column = &mapping.column;
        quote! { ::corm::SetterMapping::new(#property, #column) }
    });

    let getter_arms = mappings.iter().map(|mapping| {
        let ident = mapping.ident;
        let property = &mapping.property;
        quote! {
            #property => ::core::option::Option::Some(
                ::corm::Value::from(::core::clone::Clone::clone(&self.#ident))
            ),
        }
    });

    let setter_arms = mappings.iter().filter(|mapping| !mapping.derived).map(|mapping| {
        let ident = mapping.ident;
        let property = &mapping.property;
        let column = &mapping.column;
        quote! {
            #property => {
                self.#ident = ::corm::FromValue::from_value(value).map_err(|source| {
                    ::corm::MappingError::Conversion { column: #column.to_string(), source }
                })?;
                ::core::result::Result::Ok(())
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::corm::Entity for #struct_name #ty_generics #where_clause {
            fn table_mapping() -> ::core::option::Option<::corm::TableMapping> {
                ::core::option::Option::Some(::corm::TableMapping {
                    table_name: #table_name,
                    title: #title,
                    description: #description,
                })
            }

            fn columns() -> ::std::vec::Vec<::corm::ColumnMapping> {
                vec![#(#column_defs),*]
            }

            fn setters() -> ::std::vec::Vec<::corm::SetterMapping> {
                vec![#(#setter_defs),*]
            }

            fn get_value(&self, property: &str) -> ::core::option::Option<::corm::Value> {
                match property {
                    #(#getter_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unreachable_code, unused_variables)]
            fn set_value(
                &mut self,
                property: &str,
                value: ::corm::Value,
            ) -> ::core::result::Result<(), ::corm::MappingError> {
                match property {
                    #(#setter_arms)*
                    _ => ::core::result::Result::Err(::corm::MappingError::Inaccessible {
                        entity: ::core::any::type_name::<Self>(),
                        property: property.to_string(),
                    }),
                }
            }
        }
    })
}

fn parse_table_attrs(ast: &DeriveInput) -> syn::Result<TableAttrs> {
    let mut attrs = TableAttrs::default();
    for attr in &ast.attrs {
        if !attr.path().is_ident("corm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.table = Some(value.value());
            } else if meta.path.is_ident("title") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.title = value.value();
            } else if meta.path.is_ident("description") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.description = value.value();
            } else {
                return Err(meta.error("unknown corm table attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// Parses `#[corm(..)]` on one field. `None` for skipped fields.
fn parse_field(field: &Field) -> syn::Result<Option<FieldMapping<'_>>> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "Entity fields must be named"));
    };
    let property = ident.to_string().trim_start_matches("r#").to_string();

    let mut mapping = FieldMapping {
        ident,
        column: property.to_snake_case(),
        property,
        property_type: property_type(&field.ty),
        primary_key: false,
        auto_generated: false,
        read_only: false,
        listed: false,
        label: String::new(),
        sort: quote! { ::corm::SortOrder::None },
        foreign_key: None,
        derived: false,
    };
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("corm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                mapping.column = value.value();
            } else if meta.path.is_ident("primary_key") {
                mapping.primary_key = true;
            } else if meta.path.is_ident("auto_generated") {
                mapping.auto_generated = true;
            } else if meta.path.is_ident("read_only") {
                mapping.read_only = true;
            } else if meta.path.is_ident("listed") {
                mapping.listed = true;
            } else if meta.path.is_ident("derived") {
                mapping.derived = true;
            } else if meta.path.is_ident("label") {
                let value: LitStr = meta.value()?.parse()?;
                mapping.label = value.value();
            } else if meta.path.is_ident("sort") {
                let value: LitStr = meta.value()?.parse()?;
                mapping.sort = match value.value().to_ascii_lowercase().as_str() {
                    "asc" => quote! { ::corm::SortOrder::Ascending },
                    "desc" => quote! { ::corm::SortOrder::Descending },
                    _ => return Err(syn::Error::new_spanned(value, "sort must be \"asc\" or \"desc\"")),
                };
            } else if meta.path.is_ident("kind") {
                let value: LitStr = meta.value()?.parse()?;
                mapping.property_type = property_type_named(&value.value())
                    .ok_or_else(|| syn::Error::new_spanned(&value, "unknown property kind"))?;
            } else if meta.path.is_ident("foreign_key") {
                let value: LitStr = meta.value()?.parse()?;
                let fk = value.value();
                match fk.split_once("::") {
                    Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                        mapping.foreign_key = Some((table.to_string(), column.to_string()));
                    }
                    _ => return Err(meta.error("Invalid format for foreign_key. Use 'table::column'")),
                }
            } else {
                return Err(meta.error("unknown corm column attribute"));
            }
            Ok(())
        })?;
    }

    Ok(if skip { None } else { Some(mapping) })
}

fn column_tokens(mapping: &FieldMapping<'_>) -> TokenStream {
    let property = &mapping.property;
    let column = &mapping.column;
    let property_type = &mapping.property_type;

    let mut tokens = quote! { ::corm::ColumnMapping::new(#property, #column, #property_type) };
    if mapping.primary_key {
        tokens.extend(quote! { .primary_key() });
    }
    if mapping.auto_generated {
        tokens.extend(quote! { .auto_generated() });
    }
    if mapping.read_only {
        tokens.extend(quote! { .read_only() });
    }
    if mapping.listed {
        tokens.extend(quote! { .listed() });
    }
    if !mapping.label.is_empty() {
        let label = &mapping.label;
        tokens.extend(quote! { .label(#label) });
    }
    let sort = &mapping.sort;
    tokens.extend(quote! { .sorted(#sort) });
    if let Some((table, column)) = &mapping.foreign_key {
        tokens.extend(quote! { .references(#table, #column) });
    }
    tokens
}
