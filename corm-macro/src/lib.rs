//! # corm-macro
//!
//! Derive macros for corm.
//!
//! - `#[derive(Entity)]` turns a struct with named fields into a mapped entity,
//!   generating its table and column metadata plus the property accessors.
//! - `#[derive(CormEnum)]` stores a fieldless enum as text.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_entity;
mod derive_enum;
mod types;

/// Derives `corm::Entity`.
///
/// Struct attributes: `#[corm(table = "..", title = "..", description = "..")]`.
/// `table` is required, and two fields may not map the same column.
///
/// Field attributes, all inside `#[corm(..)]`:
///
/// - `column = ".."`: column name (defaults to the field name in snake case)
/// - `primary_key`, `auto_generated`, `read_only`
/// - `listed`, `label = ".."`, `sort = "asc" | "desc"`
/// - `foreign_key = "table::column"`
/// - `kind = "text" | "integer" | "decimal" | "date" | "boolean" | "binary"`
/// - `derived`: readable but never written back from a row
/// - `skip`: not mapped at all
#[proc_macro_derive(Entity, attributes(corm))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_entity::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}

/// Derives `Display`, `FromStr`, `From<E> for corm::Value` and
/// `corm::FromValue` for a fieldless enum, storing each variant under its name.
#[proc_macro_derive(CormEnum)]
pub fn enum_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_enum::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
