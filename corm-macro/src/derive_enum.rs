//! # Enum Derive Macro Implementation
//!
//! Expands `#[derive(CormEnum)]`. Each variant is stored as its name, so the
//! enum maps to a text column. `Display` and `FromStr` use the same names;
//! parsing ignores letter case.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let name = &ast.ident;

    let variants = match &ast.data {
        Data::Enum(data_enum) => &data_enum.variants,
        _ => return Err(syn::Error::new_spanned(&ast.ident, "CormEnum can only be derived for enums")),
    };
    if let Some(variant) = variants.iter().find(|variant| !matches!(variant.fields, Fields::Unit)) {
        return Err(syn::Error::new_spanned(variant, "CormEnum variants cannot carry fields"));
    }

    // Self::Variant => write!(f, "Variant")
    let display_arms = variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        quote! {
            Self::#variant_ident => f.write_str(#variant_name),
        }
    });

    let from_str_checks = variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        quote! {
            if s.eq_ignore_ascii_case(#variant_name) {
                return Ok(Self::#variant_ident);
            }
        }
    });

    let type_name = name.to_string();

    Ok(quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl ::std::str::FromStr for #name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let s = s.trim();
                #(#from_str_checks)*
                Err(format!("Unknown variant: {}", s))
            }
        }

        impl ::core::convert::From<#name> for ::corm::Value {
            fn from(value: #name) -> Self {
                ::corm::Value::Text(value.to_string())
            }
        }

        impl ::corm::FromValue for #name {
            fn from_value(value: ::corm::Value) -> ::core::result::Result<Self, ::corm::ValueError> {
                let text = <::std::string::String as ::corm::FromValue>::from_value(value)?;
                text.parse().map_err(|_| ::corm::ValueError::new(#type_name, format!("text `{}`", text)))
            }
        }
    })
}
