//! # Statement Module
//!
//! Stateless builders that render INSERT, SELECT, UPDATE and DELETE statements
//! from a [`ResolvedMapping`] and an entity instance.
//!
//! Every statement is produced in two forms at once: a literal form, with
//! values inlined through the dialect's formatting rules (used for logging and
//! diagnostics), and a parameterized form with bind placeholders plus the
//! ordered parameter list, which is what connections actually execute.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    dialect::Dialect,
    error::MappingError,
    model::{ColumnMapping, Entity, SortOrder},
    reflector::{extract_value, ResolvedMapping},
    value::Value,
};

// ============================================================================
// Statement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
    Update,
    Delete,
}

/// A generated SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    literal: String,
    parameterized: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The statement with every value rendered inline as a literal.
    pub fn sql(&self) -> &str {
        &self.literal
    }

    /// The statement with bind placeholders instead of values.
    pub fn parameterized_sql(&self) -> &str {
        &self.parameterized
    }

    /// Values for the placeholders of [`parameterized_sql`](Self::parameterized_sql), in order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

// ============================================================================
// SQL Writer
// ============================================================================

/// Writes the literal and parameterized forms of a statement side by side.
struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    literal: String,
    parameterized: String,
    params: Vec<Value>,
}

impl<'d> SqlWriter<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect, literal: String::new(), parameterized: String::new(), params: Vec::new() }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.literal.push_str(sql);
        self.parameterized.push_str(sql);
        self
    }

    fn identifier(&mut self, identifier: &str) -> &mut Self {
        let quoted = self.dialect.quote_identifier(identifier);
        self.push(&quoted)
    }

    fn identifiers<'c>(&mut self, columns: impl IntoIterator<Item = &'c ColumnMapping>) -> &mut Self {
        for (index, column) in columns.into_iter().enumerate() {
            if index > 0 {
                self.push(", ");
            }
            self.identifier(column.column_name);
        }
        self
    }

    fn value(&mut self, column: &ColumnMapping, value: Value) -> Result<&mut Self, MappingError> {
        let literal = self.dialect.format_literal(column, &value)?;
        self.literal.push_str(&literal);

        if value.is_null() {
            self.parameterized.push_str(self.dialect.null_literal());
        } else {
            self.params.push(value);
            let placeholder = self.dialect.placeholder(self.params.len(), column.property_type);
            self.parameterized.push_str(&placeholder);
        }
        Ok(self)
    }

    fn finish(self, kind: StatementKind) -> Statement {
        Statement { kind, literal: self.literal, parameterized: self.parameterized, params: self.params }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// `INSERT INTO t (c1, ..) VALUES (v1, ..)` over the insertable columns.
pub fn build_insert<T: Entity>(
    mapping: &ResolvedMapping,
    entity: &T,
    dialect: &dyn Dialect,
) -> Result<Statement, MappingError> {
    let table = dialect.quote_identifier(mapping.table_name());
    let columns: Vec<&ColumnMapping> = mapping.insertable_columns().collect();

    let mut sql = SqlWriter::new(dialect);
    if columns.is_empty() {
        sql.push(&dialect.empty_insert(&table));
        return Ok(sql.finish(StatementKind::Insert));
    }

    sql.push("INSERT INTO ").push(&table).push(" (");
    sql.identifiers(columns.iter().copied());
    sql.push(") VALUES (");
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            sql.push(", ");
        }
        let value = extract_value(entity, column)?;
        sql.value(column, value)?;
    }
    sql.push(")");

    Ok(sql.finish(StatementKind::Insert))
}

/// `SELECT .. FROM t [ORDER BY ..]` listing every row.
///
/// With `show_all_columns == false` only the listing columns are selected;
/// primary key columns are always included.
pub fn build_select_all(mapping: &ResolvedMapping, show_all_columns: bool, dialect: &dyn Dialect) -> Statement {
    let mut sql = SqlWriter::new(dialect);
    sql.push("SELECT ");
    sql.identifiers(mapping.listing_columns(show_all_columns));
    sql.push(" FROM ").identifier(mapping.table_name());

    let sorted: Vec<&ColumnMapping> =
        mapping.columns().iter().filter(|column| column.sort != SortOrder::None).collect();
    if !sorted.is_empty() {
        sql.push(" ORDER BY ");
        for (index, column) in sorted.iter().enumerate() {
            if index > 0 {
                sql.push(", ");
            }
            sql.identifier(column.column_name);
            sql.push(if column.sort == SortOrder::Ascending { " ASC" } else { " DESC" });
        }
    }

    sql.finish(StatementKind::Select)
}

/// `SELECT <all columns> FROM t WHERE <key>` for the row identified by `entity`.
pub fn build_select_by_key<T: Entity>(
    mapping: &ResolvedMapping,
    entity: &T,
    dialect: &dyn Dialect,
) -> Result<Statement, MappingError> {
    let key = mapping.require_primary_key()?;

    let mut sql = SqlWriter::new(dialect);
    sql.push("SELECT ");
    sql.identifiers(mapping.columns());
    sql.push(" FROM ").identifier(mapping.table_name());
    write_key_filter(&mut sql, mapping, &key, entity)?;

    Ok(sql.finish(StatementKind::Select))
}

/// `UPDATE t SET c = v, .. WHERE <key>`.
///
/// Columns whose current value is `Null` are left out of the SET clause.
pub fn build_update<T: Entity>(
    mapping: &ResolvedMapping,
    entity: &T,
    dialect: &dyn Dialect,
) -> Result<Statement, MappingError> {
    let key = mapping.require_primary_key()?;

    let mut assignments = Vec::new();
    for column in mapping.updatable_columns() {
        let value = extract_value(entity, column)?;
        if !value.is_null() {
            assignments.push((column, value));
        }
    }
    if assignments.is_empty() {
        return Err(MappingError::NothingToUpdate { entity: mapping.entity() });
    }

    let mut sql = SqlWriter::new(dialect);
    sql.push("UPDATE ").identifier(mapping.table_name()).push(" SET ");
    for (index, (column, value)) in assignments.into_iter().enumerate() {
        if index > 0 {
            sql.push(", ");
        }
        sql.identifier(column.column_name).push(" = ");
        sql.value(column, value)?;
    }
    write_key_filter(&mut sql, mapping, &key, entity)?;

    Ok(sql.finish(StatementKind::Update))
}

/// `DELETE FROM t WHERE <key>`.
pub fn build_delete<T: Entity>(
    mapping: &ResolvedMapping,
    entity: &T,
    dialect: &dyn Dialect,
) -> Result<Statement, MappingError> {
    let key = mapping.require_primary_key()?;

    let mut sql = SqlWriter::new(dialect);
    sql.push("DELETE FROM ").identifier(mapping.table_name());
    write_key_filter(&mut sql, mapping, &key, entity)?;

    Ok(sql.finish(StatementKind::Delete))
}

/// Appends ` WHERE k1 = v1 AND k2 = v2 ..` over the key columns.
fn write_key_filter<T: Entity>(
    sql: &mut SqlWriter<'_>,
    mapping: &ResolvedMapping,
    key: &[&ColumnMapping],
    entity: &T,
) -> Result<(), MappingError> {
    sql.push(" WHERE ");
    for (index, column) in key.iter().enumerate() {
        let value = extract_value(entity, column)?;
        if value.is_null() {
            return Err(MappingError::KeyNotSet { entity: mapping.entity(), column: column.column_name.to_string() });
        }
        if index > 0 {
            sql.push(" AND ");
        }
        sql.identifier(column.column_name).push(" = ");
        sql.value(column, value)?;
    }
    Ok(())
}
