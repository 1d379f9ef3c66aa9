use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

/// Infers the corm property type of a field from its Rust type.
///
/// `Option<T>` maps like `T`. Unknown types (typically `CormEnum` enums) are
/// stored as text.
pub fn property_type(ty: &Type) -> TokenStream {
    let name = match inner_type_name(ty) {
        Some(name) => name,
        None => return quote! { ::corm::PropertyType::Text },
    };

    match name.as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => quote! { ::corm::PropertyType::Integer },
        "f32" | "f64" => quote! { ::corm::PropertyType::Decimal },
        "bool" => quote! { ::corm::PropertyType::Boolean },
        "NaiveDate" | "NaiveDateTime" | "DateTime" => quote! { ::corm::PropertyType::Date },
        "Vec" => quote! { ::corm::PropertyType::Binary },
        _ => quote! { ::corm::PropertyType::Text },
    }
}

/// Parses the value of a `kind = ".."` attribute.
pub fn property_type_named(kind: &str) -> Option<TokenStream> {
    let tokens = match kind.to_ascii_lowercase().as_str() {
        "text" => quote! { ::corm::PropertyType::Text },
        "integer" => quote! { ::corm::PropertyType::Integer },
        "decimal" => quote! { ::corm::PropertyType::Decimal },
        "date" => quote! { ::corm::PropertyType::Date },
        "boolean" => quote! { ::corm::PropertyType::Boolean },
        "binary" => quote! { ::corm::PropertyType::Binary },
        _ => return None,
    };
    Some(tokens)
}

/// Last path segment of `ty`, looking through one `Option<..>`.
fn inner_type_name(ty: &Type) -> Option<String> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;

    if segment.ident == "Option" {
        if let PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(GenericArgument::Type(inner)) = args.args.first() {
                return inner_type_name(inner);
            }
        }
    }
    Some(segment.ident.to_string())
}
