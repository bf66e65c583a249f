//! SQLite store via rusqlite.
//!
//! Configuration: WAL journal, synchronous OFF, large page cache. These match
//! the settings used when comparing schemas in memory and keep fsync cost out
//! of the insert timings.

use super::{Row, Store, TableLayout, Value};
use crate::error::StoreError;
use crate::schema::Dialect;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ToSql};

pub const IN_MEMORY: &str = ":memory:";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open `path`, or a private in-memory database for [`IN_MEMORY`].
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY)
    }
}

/// Configure a connection for bulk-load throughput.
pub fn configure_connection(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = OFF;
         PRAGMA cache_size = -131072;
         PRAGMA temp_store = MEMORY;",
    )?;
    Ok(())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(v) => ToSqlOutput::from(*v),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn from_ref(value: ValueRef<'_>) -> Result<Value, StoreError> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Int(i)),
        ValueRef::Text(bytes) => Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Real(_) => Err(StoreError::UnsupportedType("REAL".to_string())),
        ValueRef::Blob(_) => Err(StoreError::UnsupportedType("BLOB".to_string())),
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_ref(row.get_ref(i)?)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        // Outside BEGIN every statement has already been committed.
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn describe(&mut self, table: &str) -> Result<TableLayout, StoreError> {
        let mut layout = TableLayout::default();

        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt.query_map(params![table], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        for col in columns {
            layout.columns.push(col?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT ii.name
             FROM pragma_index_list(?1) AS il
             JOIN pragma_index_info(il.name) AS ii
             WHERE il.origin <> 'pk'",
        )?;
        let indexed = stmt.query_map(params![table], |r| r.get::<_, String>(0))?;
        for name in indexed {
            layout.indexed_columns.insert(name?);
        }

        Ok(layout)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_and_query_round_values() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE t (a INTEGER, b TEXT)", &[])
            .unwrap();
        let n = store
            .execute(
                "INSERT INTO t (a, b) VALUES (?1, ?2), (?3, ?4)",
                &[
                    Value::Int(7),
                    Value::Text("x".into()),
                    Value::Int(8),
                    Value::Null,
                ],
            )
            .unwrap();
        assert_eq!(n, 2);

        let rows = store
            .query("SELECT a, b FROM t WHERE a = ?1", &[Value::Int(8)])
            .unwrap();
        assert_eq!(rows, vec![vec![Value::Int(8), Value::Null]]);
    }

    #[test]
    fn describe_reports_secondary_indexes_only() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v INTEGER, w TEXT)", &[])
            .unwrap();
        store.execute("CREATE INDEX idx_t_v ON t (v)", &[]).unwrap();

        let layout = store.describe("t").unwrap();
        assert_eq!(
            layout.columns,
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("v".to_string(), "INTEGER".to_string()),
                ("w".to_string(), "TEXT".to_string()),
            ]
        );
        assert_eq!(layout.indexed_columns.len(), 1);
        assert!(layout.indexed_columns.contains("v"));
    }

    #[test]
    fn open_fails_for_missing_directory() {
        let result = SqliteStore::open("/nonexistent-dir/for/index-bench/db.sqlite3");
        assert!(result.is_err());
    }
}
