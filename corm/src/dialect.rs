//! # Dialect Module
//!
//! Dialect providers supply every piece of SQL syntax that differs between
//! database products: identifier quoting, placeholders and literal formatting.
//! The statement builder never writes a dialect-specific token itself.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{fmt, str::FromStr, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::ConfigError,
    error::MappingError,
    model::ColumnMapping,
    value::{PropertyType, Value},
};

// ============================================================================
// Dialect Kind
// ============================================================================

/// Names a dialect provider in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[serde(alias = "postgres")]
    PostgreSql,
    MySql,
    Sqlite,
}

impl DialectKind {
    /// Instantiates the provider for this dialect.
    pub fn provider(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::PostgreSql => Arc::new(PostgreSql),
            DialectKind::MySql => Arc::new(MySql),
            DialectKind::Sqlite => Arc::new(Sqlite),
        }
    }

    /// Detects the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            DialectKind::PostgreSql
        } else if url.starts_with("mysql") || url.starts_with("mariadb") {
            DialectKind::MySql
        } else {
            DialectKind::Sqlite
        }
    }

    /// The sqlx URL scheme of the dialect.
    pub fn scheme(self) -> &'static str {
        match self {
            DialectKind::PostgreSql => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for DialectKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DialectKind::PostgreSql),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            _ => Err(ConfigError::UnknownDialect(s.to_string())),
        }
    }
}

// ============================================================================
// Dialect Trait
// ============================================================================

/// A dialect provider. One instance is chosen per data source and shared by
/// every statement sent to it; implementations hold no mutable state.
pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Product name the provider targets.
    fn provider_name(&self) -> &'static str;

    /// Identifier of the driver used to reach the database (sqlx scheme).
    fn driver_name(&self) -> &'static str {
        self.kind().scheme()
    }

    /// Lower-case words that must be quoted when used as identifiers.
    fn reserved_words(&self) -> &'static [&'static str];

    fn is_reserved(&self, identifier: &str) -> bool {
        self.reserved_words().iter().any(|word| word.eq_ignore_ascii_case(identifier))
    }

    fn quote_char(&self) -> char {
        '"'
    }

    /// Quotes an identifier only when it collides with a reserved word.
    fn quote_identifier(&self, identifier: &str) -> String {
        if self.is_reserved(identifier) {
            let quote = self.quote_char();
            let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
            format!("{quote}{escaped}{quote}")
        } else {
            identifier.to_string()
        }
    }

    /// Bind placeholder for the `index`-th parameter (1-based).
    fn placeholder(&self, _index: usize, _property_type: PropertyType) -> String {
        "?".to_string()
    }

    /// `chrono` format used for date literals.
    fn date_format(&self) -> &'static str {
        "%Y/%m/%d"
    }

    fn null_literal(&self) -> &'static str {
        "NULL"
    }

    /// Quotes text, doubling embedded single quotes. No other escaping.
    fn format_text(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    fn format_integer(&self, value: i64) -> String {
        value.to_string()
    }

    fn format_decimal(&self, value: f64) -> String {
        value.to_string()
    }

    fn format_date(&self, date: NaiveDate) -> String {
        self.format_text(&date.format(self.date_format()).to_string())
    }

    fn format_boolean(&self, value: bool) -> String {
        self.format_text(if value { "1" } else { "0" })
    }

    /// Binary literals have no portable form; dialects opt in.
    fn format_binary(&self, _bytes: &[u8]) -> Option<String> {
        None
    }

    fn supports(&self, property_type: PropertyType) -> bool {
        property_type != PropertyType::Binary
    }

    /// Renders `value` as a SQL literal according to the column's property type.
    fn format_literal(&self, column: &ColumnMapping, value: &Value) -> Result<String, MappingError> {
        if !self.supports(column.property_type) {
            return Err(MappingError::UnsupportedType {
                column: column.column_name.to_string(),
                property_type: column.property_type,
            });
        }

        let literal = match (column.property_type, value) {
            (_, Value::Null) => Some(self.null_literal().to_string()),
            (PropertyType::Text, Value::Text(text)) => Some(self.format_text(text)),
            (PropertyType::Integer, Value::Integer(number)) => Some(self.format_integer(*number)),
            (PropertyType::Decimal, Value::Decimal(number)) if !number.is_finite() => {
                return Err(MappingError::TypeMismatch {
                    column: column.column_name.to_string(),
                    expected: PropertyType::Decimal,
                    found: "non-finite decimal",
                });
            }
            (PropertyType::Decimal, Value::Decimal(number)) => Some(self.format_decimal(*number)),
            (PropertyType::Decimal, Value::Integer(number)) => Some(self.format_integer(*number)),
            (PropertyType::Date, Value::Date(date)) => Some(self.format_date(*date)),
            (PropertyType::Boolean, Value::Boolean(flag)) => Some(self.format_boolean(*flag)),
            (PropertyType::Binary, Value::Binary(bytes)) => self.format_binary(bytes),
            (expected, found) => {
                return Err(MappingError::TypeMismatch {
                    column: column.column_name.to_string(),
                    expected,
                    found: found.type_name(),
                });
            }
        };

        literal.ok_or_else(|| MappingError::UnsupportedType {
            column: column.column_name.to_string(),
            property_type: column.property_type,
        })
    }

    /// INSERT statement for a row that supplies no column at all.
    fn empty_insert(&self, table: &str) -> String {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

const POSTGRESQL_RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "current_date", "current_role",
    "current_time", "current_timestamp", "current_user", "default", "deferrable", "desc",
    "distinct", "do", "else", "end", "except", "false", "fetch", "for", "foreign", "from", "grant",
    "group", "having", "in", "initially", "intersect", "into", "lateral", "leading", "limit",
    "localtime", "localtimestamp", "not", "null", "offset", "on", "only", "or", "order", "placing",
    "primary", "references", "returning", "select", "session_user", "some", "symmetric", "table",
    "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when",
    "where", "window", "with",
];

/// Provider for PostgreSQL 9 and later.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSql;

impl Dialect for PostgreSql {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn provider_name(&self) -> &'static str {
        "PostgreSQL CORM Driver"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        POSTGRESQL_RESERVED
    }

    fn placeholder(&self, index: usize, property_type: PropertyType) -> String {
        match property_type {
            // Dates travel as text and need an explicit cast.
            PropertyType::Date => format!("CAST(${} AS DATE)", index),
            _ => format!("${}", index),
        }
    }

    fn format_binary(&self, bytes: &[u8]) -> Option<String> {
        let hex: String = bytes.iter().map(|byte| format!("{:02x}", byte)).collect();
        Some(format!("'\\x{}'", hex))
    }

    fn supports(&self, _property_type: PropertyType) -> bool {
        true
    }
}

// ============================================================================
// MySQL
// ============================================================================

const MYSQL_RESERVED: &[&str] = &[
    "add", "all", "alter", "and", "as", "asc", "before", "between", "both", "by", "call", "case",
    "change", "check", "collate", "column", "condition", "constraint", "create", "cross",
    "current_date", "current_time", "current_timestamp", "current_user", "database", "default",
    "delete", "desc", "describe", "distinct", "div", "drop", "else", "exists", "false", "for",
    "force", "foreign", "from", "grant", "group", "having", "if", "ignore", "in", "index", "inner",
    "insert", "interval", "into", "is", "join", "key", "keys", "kill", "leading", "left", "like",
    "limit", "lines", "load", "lock", "match", "mod", "not", "null", "on", "option", "or", "order",
    "outer", "primary", "range", "read", "references", "regexp", "rename", "replace", "require",
    "right", "select", "set", "show", "table", "then", "to", "trailing", "true", "union", "unique",
    "update", "usage", "use", "using", "values", "when", "where", "with", "write",
];

/// Provider for MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn provider_name(&self) -> &'static str {
        "MySQL CORM Driver"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        MYSQL_RESERVED
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn empty_insert(&self, table: &str) -> String {
        format!("INSERT INTO {} () VALUES ()", table)
    }
}

// ============================================================================
// SQLite
// ============================================================================

const SQLITE_RESERVED: &[&str] = &[
    "abort", "add", "all", "alter", "and", "as", "asc", "autoincrement", "between", "by", "case",
    "check", "collate", "column", "commit", "constraint", "create", "cross", "default", "delete",
    "desc", "distinct", "drop", "else", "escape", "except", "exists", "foreign", "from", "full",
    "glob", "group", "having", "in", "index", "inner", "insert", "intersect", "into", "is",
    "isnull", "join", "left", "like", "limit", "natural", "not", "notnull", "null", "on", "or",
    "order", "outer", "primary", "references", "right", "select", "set", "table", "then", "to",
    "transaction", "union", "unique", "update", "using", "values", "when", "where",
];

/// Provider for SQLite 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn provider_name(&self) -> &'static str {
        "SQLite CORM Driver"
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        SQLITE_RESERVED
    }
}
