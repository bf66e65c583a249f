//! Data store boundary and its drivers.
//!
//! - [`sqlite::SqliteStore`]: embedded SQLite, in memory or on disk
//! - [`pg::PostgresStore`]: a network PostgreSQL server

pub mod pg;
pub mod sqlite;

use crate::config::{Backend, Config};
use crate::error::{BenchError, BenchResult, StoreError};
use crate::schema::Dialect;
use std::collections::BTreeSet;

/// A single column value crossing the store boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

pub type Row = Vec<Value>;

/// What a store reports about an existing table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    /// `(name, declared type)` in column order.
    pub columns: Vec<(String, String)>,
    /// Columns covered by a secondary (non primary key) index.
    pub indexed_columns: BTreeSet<String>,
}

/// Minimal capability set the runner needs from a relational store.
///
/// Implementations hold exactly one connection. Statements are always
/// parameterized; `params` bind to the dialect's positional placeholders.
pub trait Store {
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, StoreError>;

    /// Run a query and materialize every row.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn describe(&mut self, table: &str) -> Result<TableLayout, StoreError>;

    fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Open the store selected by `config`. Any failure is a connection error.
pub fn connect(config: &Config) -> BenchResult<Box<dyn Store>> {
    match config.backend {
        Backend::Sqlite => {
            log::info!("Opening SQLite store at {}", config.sqlite_path);
            let store = sqlite::SqliteStore::open(&config.sqlite_path)
                .map_err(BenchError::Connection)?;
            Ok(Box::new(store))
        }
        Backend::Postgres => {
            log::info!(
                "Connecting to PostgreSQL {}@{}:{}/{}",
                config.user,
                config.host,
                config.port,
                config.database
            );
            let store = pg::PostgresStore::connect(
                &config.host,
                config.port,
                &config.user,
                &config.password,
                &config.database,
                config.connect_timeout,
            )
            .map_err(BenchError::Connection)?;
            Ok(Box::new(store))
        }
    }
}
