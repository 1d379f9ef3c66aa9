//! # Orm Module
//!
//! The execution facade. `Orm` binds one dialect provider to a data source and
//! runs each CRUD operation as a single connect, execute, disconnect sequence
//! on a connection of its own.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{collections::VecDeque, marker::PhantomData, sync::Arc};

use futures::stream::{self, Stream};
use log::{debug, warn};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    connection::{DataConnection, DataSource, Row},
    dialect::Dialect,
    error::Error,
    model::Entity,
    reflector::{self, ResolvedMapping},
    statement::{self, Statement},
};

// ============================================================================
// Executed
// ============================================================================

/// The outcome of a facade operation together with the statement it ran.
#[derive(Debug)]
pub struct Executed<T> {
    output: T,
    statement: Statement,
}

impl<T> Executed<T> {
    fn new(output: T, statement: Statement) -> Self {
        Self { output, statement }
    }

    pub fn output(&self) -> &T {
        &self.output
    }

    pub fn into_output(self) -> T {
        self.output
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Literal SQL of the statement that produced this result. Diagnostic only.
    pub fn last_generated_statement(&self) -> &str {
        self.statement.sql()
    }

    pub fn into_parts(self) -> (T, Statement) {
        (self.output, self.statement)
    }
}

// ============================================================================
// Orm
// ============================================================================

/// Runs generated statements against a data source.
///
/// `Orm` holds no per-call state, so one instance can serve concurrent callers;
/// every operation obtains a fresh connection from the source.
#[derive(Debug, Clone)]
pub struct Orm<S> {
    source: S,
    dialect: Arc<dyn Dialect>,
}

impl<S: DataSource> Orm<S> {
    pub fn new(source: S, dialect: Arc<dyn Dialect>) -> Self {
        Self { source, dialect }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn provider_name(&self) -> &'static str {
        self.dialect.provider_name()
    }

    /// Inserts `entity`, returning the number of affected rows.
    pub async fn insert<T: Entity>(&self, entity: &T) -> Result<Executed<u64>, Error> {
        let mapping = reflector::resolve::<T>()?;
        let statement = statement::build_insert(&mapping, entity, self.dialect())?;
        self.execute(statement).await
    }

    /// Updates the row identified by the primary key of `entity`.
    pub async fn update<T: Entity>(&self, entity: &T) -> Result<Executed<u64>, Error> {
        let mapping = reflector::resolve::<T>()?;
        let statement = statement::build_update(&mapping, entity, self.dialect())?;
        self.execute(statement).await
    }

    /// Deletes the row identified by the primary key of `entity`.
    pub async fn delete<T: Entity>(&self, entity: &T) -> Result<Executed<u64>, Error> {
        let mapping = reflector::resolve::<T>()?;
        let statement = statement::build_delete(&mapping, entity, self.dialect())?;
        self.execute(statement).await
    }

    /// Loads the row identified by the primary key of `template` into it.
    ///
    /// Returns `None` when no row matches. If several rows match, the first wins.
    pub async fn get<T: Entity>(&self, mut template: T) -> Result<Executed<Option<T>>, Error> {
        let mapping = reflector::resolve::<T>()?;
        let statement = statement::build_select_by_key(&mapping, &template, self.dialect())?;
        let rows = self.query(&statement).await?;

        let Some(row) = rows.first() else {
            return Ok(Executed::new(None, statement));
        };
        reflector::materialize(&mapping, &mut template, row)?;
        Ok(Executed::new(Some(template), statement))
    }

    /// Lists every row of `T`'s table.
    ///
    /// The returned cursor owns its connection; it disconnects once drained or
    /// when [`RowCursor::close`] is called.
    pub async fn select<T: Entity + Default>(
        &self,
        show_all_columns: bool,
    ) -> Result<Executed<RowCursor<T, S::Connection>>, Error> {
        let mapping = reflector::resolve::<T>()?;
        let statement = statement::build_select_all(&mapping, show_all_columns, self.dialect());
        debug!("{}", statement.sql());

        let mut connection = self.source.connection();
        connection.connect().await.map_err(Error::Connection)?;

        match connection.execute_query(&statement).await {
            Ok(rows) if rows.is_empty() => {
                release(&mut connection).await;
                Ok(Executed::new(RowCursor::new(None, mapping, rows), statement))
            }
            Ok(rows) => Ok(Executed::new(RowCursor::new(Some(connection), mapping, rows), statement)),
            Err(source) => {
                release(&mut connection).await;
                Err(Error::Execution { sql: statement.sql().to_string(), source })
            }
        }
    }

    /// Runs a write statement on a connection of its own.
    async fn execute(&self, statement: Statement) -> Result<Executed<u64>, Error> {
        debug!("{}", statement.sql());

        let mut connection = self.source.connection();
        connection.connect().await.map_err(Error::Connection)?;
        let result = connection.execute(&statement).await;
        release(&mut connection).await;

        match result {
            Ok(affected) => Ok(Executed::new(affected, statement)),
            Err(source) => Err(Error::Execution { sql: statement.sql().to_string(), source }),
        }
    }

    /// Runs a query on a connection of its own and buffers every row.
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, Error> {
        debug!("{}", statement.sql());

        let mut connection = self.source.connection();
        connection.connect().await.map_err(Error::Connection)?;
        let result = connection.execute_query(statement).await;
        release(&mut connection).await;

        result.map_err(|source| Error::Execution { sql: statement.sql().to_string(), source })
    }
}

/// Best-effort disconnect; a failure here never masks the operation's result.
async fn release<C: DataConnection>(connection: &mut C) {
    if let Err(err) = connection.disconnect().await {
        warn!("failed to disconnect cleanly: {}", err);
    }
}

// ============================================================================
// Row Cursor
// ============================================================================

/// Yields the entities of a `select`, holding the connection until drained.
pub struct RowCursor<T, C: DataConnection> {
    connection: Option<C>,
    mapping: Arc<ResolvedMapping>,
    rows: VecDeque<Row>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity + Default, C: DataConnection> RowCursor<T, C> {
    fn new(connection: Option<C>, mapping: Arc<ResolvedMapping>, rows: Vec<Row>) -> Self {
        Self { connection, mapping, rows: rows.into(), _entity: PhantomData }
    }

    /// Rows not yet yielded.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Materializes the next row, or disconnects and returns `None` once exhausted.
    ///
    /// A row that cannot be materialized also disconnects, and discards the
    /// rows still unread.
    pub async fn next(&mut self) -> Result<Option<T>, Error> {
        let Some(row) = self.rows.pop_front() else {
            self.disconnect().await;
            return Ok(None);
        };

        let mut entity = T::default();
        if let Err(err) = reflector::materialize(&self.mapping, &mut entity, &row) {
            // A failed row ends the cursor.
            self.rows.clear();
            self.disconnect().await;
            return Err(err.into());
        }
        if self.rows.is_empty() {
            self.disconnect().await;
        }
        Ok(Some(entity))
    }

    /// Drains the cursor into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>, Error> {
        let mut entities = Vec::with_capacity(self.rows.len());
        while let Some(entity) = self.next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Releases the connection without reading the remaining rows.
    pub async fn close(mut self) {
        self.rows.clear();
        self.disconnect().await;
    }

    /// Turns the cursor into a stream of entities.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> {
        stream::try_unfold(self, |mut cursor| async move {
            let next = cursor.next().await?;
            Ok::<_, Error>(next.map(|entity| (entity, cursor)))
        })
    }

    async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            release(&mut connection).await;
        }
    }
}

impl<T, C: DataConnection> Drop for RowCursor<T, C> {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!(
                "row cursor over `{}` dropped with {} unread rows; connection dropped without disconnect",
                self.mapping.table_name(),
                self.rows.len()
            );
        }
    }
}
