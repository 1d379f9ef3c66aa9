//! # Database Module
//!
//! The sqlx-backed data source. It owns a lazily opened `AnyPool`, detects the
//! dialect from the connection URL, and hands out one pooled connection per
//! facade call. Statements are always executed in their parameterized form.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use log::info;
use sqlx::{
    any::{AnyArguments, AnyPoolOptions, AnyRow},
    pool::PoolConnection,
    Any, AnyPool, Arguments, Column, Row as _, TypeInfo, ValueRef,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::DataSourceConfig,
    connection::{DataConnection, DataSource, Row},
    dialect::DialectKind,
    error::{BoxError, Error},
    orm::Orm,
    statement::Statement,
    value::Value,
};

// ============================================================================
// SqlxSource Struct
// ============================================================================

/// A pooled sqlx data source for PostgreSQL, MySQL or SQLite.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct SqlxSource {
    pool: AnyPool,
    dialect: DialectKind,
}

impl SqlxSource {
    /// Creates a new builder for configuring the pool.
    pub fn builder() -> SqlxSourceBuilder {
        SqlxSourceBuilder::new()
    }

    /// Opens a source for `url` with default pool settings.
    pub fn connect(url: &str) -> Result<Self, Error> {
        SqlxSourceBuilder::new().connect(url)
    }

    /// Opens a source described by configuration.
    pub fn from_config(config: &DataSourceConfig) -> Result<Self, Error> {
        let mut builder = SqlxSourceBuilder::new();
        if let Some(max) = config.max_connections {
            builder = builder.max_connections(max);
        }
        builder.dialect(config.dialect).connect(&config.connection_url())
    }

    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// An execution facade bound to this source and its dialect provider.
    pub fn orm(&self) -> Orm<SqlxSource> {
        Orm::new(self.clone(), self.dialect.provider())
    }

    /// Executes hand-written SQL such as DDL. Returns the affected row count.
    pub async fn execute_raw(&self, sql: &str) -> Result<u64, Error> {
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::Execution { sql: sql.to_string(), source: Box::new(err) })?;
        Ok(result.rows_affected())
    }
}

impl DataSource for SqlxSource {
    type Connection = SqlxConnection;

    fn connection(&self) -> SqlxConnection {
        SqlxConnection { pool: self.pool.clone(), conn: None }
    }
}

// ============================================================================
// SqlxSourceBuilder Struct
// ============================================================================

pub struct SqlxSourceBuilder {
    max_connections: u32,
    dialect: Option<DialectKind>,
}

impl Default for SqlxSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlxSourceBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5, dialect: None }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Overrides dialect detection from the URL scheme.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Creates the pool. No connection is opened until the first operation,
    /// so an unreachable database surfaces as a connection error at call time.
    pub fn connect(self, url: &str) -> Result<SqlxSource, Error> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_lazy(url)
            .map_err(|err| Error::Connection(Box::new(err)))?;
        let dialect = self.dialect.unwrap_or_else(|| DialectKind::from_url(url));

        info!("opened {} data source (max {} connections)", dialect, self.max_connections);
        Ok(SqlxSource { pool, dialect })
    }
}

// ============================================================================
// SqlxConnection Struct
// ============================================================================

/// One pooled connection. `disconnect` hands it back to the pool.
pub struct SqlxConnection {
    pool: AnyPool,
    conn: Option<PoolConnection<Any>>,
}

impl SqlxConnection {
    fn connection(&mut self) -> Result<&mut PoolConnection<Any>, BoxError> {
        self.conn.as_mut().ok_or_else(|| "connection is not open".into())
    }
}

#[async_trait]
impl DataConnection for SqlxConnection {
    async fn connect(&mut self) -> Result<(), BoxError> {
        if self.conn.is_none() {
            self.conn = Some(self.pool.acquire().await?);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BoxError> {
        drop(self.conn.take());
        Ok(())
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, BoxError> {
        let args = bind_params(statement.params())?;
        let conn = self.connection()?;
        let result = sqlx::query_with(statement.parameterized_sql(), args).execute(&mut **conn).await?;
        Ok(result.rows_affected())
    }

    async fn execute_query(&mut self, statement: &Statement) -> Result<Vec<Row>, BoxError> {
        let args = bind_params(statement.params())?;
        let conn = self.connection()?;
        let rows = sqlx::query_with(statement.parameterized_sql(), args).fetch_all(&mut **conn).await?;
        rows.iter().map(decode_row).collect()
    }
}

// ============================================================================
// Value Conversion
// ============================================================================

fn bind_params<'q>(params: &[Value]) -> Result<AnyArguments<'q>, BoxError> {
    let mut args = AnyArguments::default();
    for param in params {
        match param {
            Value::Null => args.add(Option::<String>::None)?,
            Value::Text(text) => args.add(text.clone())?,
            Value::Integer(number) => args.add(*number)?,
            Value::Decimal(number) => args.add(*number)?,
            // The Any driver has no date type; ISO text is accepted everywhere.
            Value::Date(date) => args.add(date.format("%Y-%m-%d").to_string())?,
            Value::Boolean(flag) => args.add(*flag)?,
            Value::Binary(bytes) => args.add(bytes.clone())?,
        }
    }
    Ok(args)
}

fn decode_row(row: &AnyRow) -> Result<Row, BoxError> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "BOOLEAN" => Value::Boolean(row.try_get(index)?),
                "SMALLINT" => Value::Integer(i64::from(row.try_get::<i16, _>(index)?)),
                "INTEGER" => Value::Integer(i64::from(row.try_get::<i32, _>(index)?)),
                "BIGINT" => Value::Integer(row.try_get(index)?),
                "REAL" => Value::Decimal(f64::from(row.try_get::<f32, _>(index)?)),
                "DOUBLE" => Value::Decimal(row.try_get(index)?),
                "BLOB" => Value::Binary(row.try_get(index)?),
                _ => Value::Text(row.try_get(index)?),
            }
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}
