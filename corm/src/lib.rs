//! # corm
//!
//! A metadata-driven object-relational mapper. Entities describe their table
//! and columns declaratively (usually through `#[derive(Entity)]`); corm
//! validates that metadata once per type, renders INSERT, SELECT, UPDATE and
//! DELETE statements through a pluggable SQL dialect, and runs them on a data
//! source with one connection per operation.
//!
//! ```rust,ignore
//! use corm::{Entity, SqlxSource};
//!
//! #[derive(Entity, Debug, Default)]
//! #[corm(table = "travel")]
//! struct Travel {
//!     #[corm(primary_key, auto_generated)]
//!     id: Option<i32>,
//!     name: String,
//! }
//!
//! let source = SqlxSource::connect("sqlite::memory:")?;
//! let orm = source.orm();
//! orm.insert(&Travel { id: None, name: "Trip".into() }).await?;
//! let all = orm.select::<Travel>(true).await?.into_output().collect_all().await?;
//! ```

// Generated code refers to `::corm::..`, which must resolve inside this crate too.
extern crate self as corm;

pub mod config;
pub mod connection;
pub mod database;
pub mod dialect;
pub mod error;
pub mod model;
pub mod orm;
pub mod reflector;
pub mod statement;
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use corm_macro::{CormEnum, Entity};

pub use config::{ConfigError, CormConfig, DataSourceConfig};
pub use connection::{DataConnection, DataSource, Row};
pub use database::{SqlxConnection, SqlxSource, SqlxSourceBuilder};
pub use dialect::{Dialect, DialectKind, MySql, PostgreSql, Sqlite};
pub use error::{BoxError, Error, MappingError, ValueError};
pub use model::{ColumnMapping, Entity, ForeignKey, SetterMapping, SortOrder, TableMapping};
pub use orm::{Executed, Orm, RowCursor};
pub use reflector::ResolvedMapping;
pub use statement::{Statement, StatementKind};
pub use value::{FromValue, PropertyType, Value};
