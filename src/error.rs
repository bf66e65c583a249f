//! Error taxonomy for a benchmark run.
//!
//! Every variant is fatal: errors propagate to `main` unchanged and nothing is
//! retried, since a retried statement would skew the timing samples.

use crate::runner::Phase;
use thiserror::Error;

pub type BenchResult<T> = std::result::Result<T, BenchError>;

/// Driver-level failure reported by a [`crate::store::Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] postgres::Error),
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Error)]
pub enum BenchError {
    /// Store unreachable or credentials rejected.
    #[error("Connection error: {0}")]
    Connection(#[source] StoreError),
    /// DDL rejected, or the provisioned schema does not match its spec.
    #[error("Schema error on `{table}`: {reason}")]
    Schema {
        table: String,
        reason: String,
        #[source]
        source: Option<StoreError>,
    },
    #[error("Write error on `{table}`: {source}")]
    Write {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("Query error on `{table}`: {source}")]
    Query {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("Row count mismatch on `{table}`: expected {expected}, found {found}")]
    RowCount {
        table: String,
        expected: u64,
        found: u64,
    },
    #[error("Config error: {0}")]
    Config(String),
    #[error("`{operation}` is not allowed in phase {phase:?}")]
    Phase {
        operation: &'static str,
        phase: Phase,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export error: {0}")]
    Export(#[from] serde_json::Error),
}

impl BenchError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        BenchError::Schema {
            table: table.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn ddl(table: &str, source: StoreError) -> Self {
        BenchError::Schema {
            table: table.to_string(),
            reason: "statement rejected".to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn write(table: &str, source: StoreError) -> Self {
        BenchError::Write {
            table: table.to_string(),
            source,
        }
    }

    pub(crate) fn query(table: &str, source: StoreError) -> Self {
        BenchError::Query {
            table: table.to_string(),
            source,
        }
    }
}
