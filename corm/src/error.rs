//! # Error Module
//!
//! Error taxonomy for corm. Mapping problems are programmer errors and are
//! reported before any connection is opened; connection and execution failures
//! come from the data-source collaborator and are surfaced unchanged.

use thiserror::Error;

use crate::{config::ConfigError, value::PropertyType};

/// Boxed error type used at the connection boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A `Value` could not be converted into the Rust type of a property.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read {found} as {expected}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueError {
    pub fn new(expected: &'static str, found: impl Into<String>) -> Self {
        Self { expected, found: found.into() }
    }
}

/// The metadata of an entity is absent, inconsistent or insufficient for the
/// requested operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("{entity} has no table mapping")]
    MissingTable { entity: &'static str },

    #[error("{entity} declares an empty table name")]
    EmptyTableName { entity: &'static str },

    #[error("{entity} declares no persistable columns")]
    NoColumns { entity: &'static str },

    #[error("column `{column}` is mapped more than once on {entity}")]
    DuplicateColumn { entity: &'static str, column: String },

    #[error("property `{property}` is mapped more than once on {entity}")]
    DuplicateProperty { entity: &'static str, property: String },

    #[error("property `{property}` of {entity} reads column `{getter}` but writes column `{setter}`")]
    AccessorMismatch { entity: &'static str, property: String, getter: String, setter: String },

    #[error("property `{property}` of {entity} has a setter but no getter")]
    SetterWithoutGetter { entity: &'static str, property: String },

    #[error("{entity} does not declare a primary key")]
    NoPrimaryKey { entity: &'static str },

    #[error("primary key column `{column}` of {entity} is not set")]
    KeyNotSet { entity: &'static str, column: String },

    #[error("{entity} has no populated columns to update")]
    NothingToUpdate { entity: &'static str },

    #[error("column `{column}` has property type {property_type}, which the active dialect cannot render")]
    UnsupportedType { column: String, property_type: PropertyType },

    #[error("column `{column}` is declared {expected} but holds a {found} value")]
    TypeMismatch { column: String, expected: PropertyType, found: &'static str },

    #[error("property `{property}` of {entity} is not accessible")]
    Inaccessible { entity: &'static str, property: String },

    #[error("column `{column}`: {source}")]
    Conversion {
        column: String,
        #[source]
        source: ValueError,
    },
}

/// Crate-level error returned by every public operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("connection error: {0}")]
    Connection(#[source] BoxError),

    #[error("execution of `{sql}` failed: {source}")]
    Execution {
        sql: String,
        #[source]
        source: BoxError,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// The SQL text attached to an execution failure, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Error::Mapping(_))
    }
}
