//! # Value Module
//!
//! Property types and the dynamically typed `Value` that flows between an
//! entity's accessors, the statement builder and the connection layer.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::error::ValueError;

// ============================================================================
// Property Type
// ============================================================================

/// The persisted type of a column, used to select a literal formatting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Text,
    Integer,
    Decimal,
    Date,
    Boolean,
    Binary,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::Text => "Text",
            PropertyType::Integer => "Integer",
            PropertyType::Decimal => "Decimal",
            PropertyType::Date => "Date",
            PropertyType::Boolean => "Boolean",
            PropertyType::Binary => "Binary",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Value
// ============================================================================

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Boolean(bool),
    Binary(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the held variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::Boolean(_) => "boolean",
            Value::Binary(_) => "binary",
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Decimal(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

// Dates never carry a time component once persisted.
impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::Date(value.date_naive())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

// ============================================================================
// FromValue Trait
// ============================================================================

/// Conversion from a `Value` read out of a row into a property's Rust type.
///
/// Implemented for the primitives corm maps, for `Option<T>`, and by
/// `#[derive(CormEnum)]` for text-backed enums.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(ValueError::new("text", other.type_name())),
        }
    }
}

macro_rules! impl_from_value_integer {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Integer(number) => <$t>::try_from(number)
                            .map_err(|_| ValueError::new(stringify!($t), number.to_string())),
                        Value::Text(text) => text
                            .trim()
                            .parse::<$t>()
                            .map_err(|_| ValueError::new(stringify!($t), format!("text `{}`", text))),
                        other => Err(ValueError::new(stringify!($t), other.type_name())),
                    }
                }
            }
        )*
    };
}

impl_from_value_integer!(i8, i16, i32, i64, u8, u16, u32);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Decimal(number) => Ok(number),
            Value::Integer(number) => Ok(number as f64),
            Value::Text(text) => {
                text.trim().parse().map_err(|_| ValueError::new("f64", format!("text `{}`", text)))
            }
            other => Err(ValueError::new("f64", other.type_name())),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|number| number as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Boolean(flag) => Ok(flag),
            Value::Integer(number) => Ok(number != 0),
            Value::Text(text) => match text.trim() {
                "1" | "t" | "true" | "TRUE" => Ok(true),
                "0" | "f" | "false" | "FALSE" => Ok(false),
                _ => Err(ValueError::new("bool", format!("text `{}`", text))),
            },
            other => Err(ValueError::new("bool", other.type_name())),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Date(date) => Ok(date),
            Value::Text(text) => parse_date(&text)
                .ok_or_else(|| ValueError::new("date", format!("text `{}`", text))),
            other => Err(ValueError::new("date", other.type_name())),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        NaiveDate::from_value(value).map(|date| date.and_time(chrono::NaiveTime::MIN))
    }
}

// Read back as midnight UTC of the stored date.
impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        NaiveDateTime::from_value(value).map(|moment| moment.and_utc())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Binary(bytes) => Ok(bytes),
            other => Err(ValueError::new("binary", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Accepts the `yyyy/MM/dd` form corm writes as well as ISO dates, with or
/// without a trailing time component.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_becomes_null() {
        let value: Value = Option::<i32>::None.into();
        assert!(value.is_null());
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
    }

    #[test]
    fn dates_parse_from_both_text_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(NaiveDate::from_value(Value::Text("2024/05/01".into())).ok(), expected);
        assert_eq!(NaiveDate::from_value(Value::Text("2024-05-01 00:00:00".into())).ok(), expected);
        assert!(NaiveDate::from_value(Value::Text("soon".into())).is_err());
    }

    #[test]
    fn integers_reject_overflow() {
        assert_eq!(i8::from_value(Value::Integer(12)), Ok(12));
        let err = i8::from_value(Value::Integer(1_000)).unwrap_err();
        assert_eq!(err.expected, "i8");
    }

    #[test]
    fn booleans_accept_numeric_text() {
        assert_eq!(bool::from_value(Value::Text("1".into())), Ok(true));
        assert_eq!(bool::from_value(Value::Integer(0)), Ok(false));
    }
}
