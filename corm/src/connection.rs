//! # Connection Module
//!
//! The narrow contract corm expects from the physical database layer. A
//! `DataSource` hands out one fresh `DataConnection` per operation; the
//! execution facade drives it through connect, execute and disconnect.

use async_trait::async_trait;

use crate::{error::BoxError, statement::Statement, value::Value};

// ============================================================================
// Row
// ============================================================================

/// One result row: column names paired with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Looks a column up by name. Falls back to a case-insensitive match since
    /// some databases fold unquoted identifiers.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| self.columns.iter().find(|(name, _)| name.eq_ignore_ascii_case(column)))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<C: Into<String>> FromIterator<(C, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (C, Value)>>(iter: I) -> Self {
        Self { columns: iter.into_iter().map(|(name, value)| (name.into(), value)).collect() }
    }
}

// ============================================================================
// Connection Traits
// ============================================================================

/// A single physical connection. Not assumed to be thread-safe; corm never
/// shares one between overlapping statements.
#[async_trait]
pub trait DataConnection: Send {
    async fn connect(&mut self) -> Result<(), BoxError>;

    async fn disconnect(&mut self) -> Result<(), BoxError>;

    /// Runs a write statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &Statement) -> Result<u64, BoxError>;

    /// Runs a query and returns every row it produced.
    async fn execute_query(&mut self, statement: &Statement) -> Result<Vec<Row>, BoxError>;
}

/// Produces connection objects, one per facade call.
pub trait DataSource: Send + Sync {
    type Connection: DataConnection;

    fn connection(&self) -> Self::Connection;
}
