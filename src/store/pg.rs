//! PostgreSQL store via the synchronous `postgres` client.

use super::{Row, Store, TableLayout, Value};
use crate::error::StoreError;
use crate::schema::Dialect;
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls, Statement};
use std::collections::HashMap;
use std::time::Duration;

pub struct PostgresStore {
    client: Client,
    /// Prepared statements keyed by SQL text. Cleared on every DDL statement,
    /// since a dropped and recreated table invalidates their plans.
    statements: HashMap<String, Statement>,
}

impl PostgresStore {
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut config = postgres::Config::new();
        config
            .host(host)
            .port(port)
            .user(user)
            .password(password)
            .dbname(database)
            .connect_timeout(connect_timeout);
        let client = config.connect(NoTls)?;
        Ok(Self {
            client,
            statements: HashMap::new(),
        })
    }

    fn prepare(&mut self, sql: &str) -> Result<Statement, StoreError> {
        if let Some(stmt) = self.statements.get(sql) {
            return Ok(stmt.clone());
        }
        let stmt = self.client.prepare(sql)?;
        self.statements.insert(sql.to_string(), stmt.clone());
        Ok(stmt)
    }
}

fn is_ddl(sql: &str) -> bool {
    let head = sql.trim_start().to_ascii_uppercase();
    head.starts_with("CREATE") || head.starts_with("DROP") || head.starts_with("ALTER")
}

fn bind(params: &[Value]) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .iter()
        .map(|v| -> Box<dyn ToSql + Sync> {
            match v {
                Value::Null => Box::new(Option::<i64>::None),
                Value::Int(i) => Box::new(*i),
                Value::Text(s) => Box::new(s.clone()),
            }
        })
        .collect()
}

fn from_row(row: &postgres::Row) -> Result<Row, StoreError> {
    let mut values = Vec::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        let ty = col.type_();
        let value = if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(i)?.map(Value::Int)
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(i)?
                .map(|v| Value::Int(i64::from(v)))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(i)?
                .map(|v| Value::Int(i64::from(v)))
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::NAME {
            row.try_get::<_, Option<String>>(i)?.map(Value::Text)
        } else {
            return Err(StoreError::UnsupportedType(ty.name().to_string()));
        };
        values.push(value.unwrap_or(Value::Null));
    }
    Ok(values)
}

impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, StoreError> {
        if params.is_empty() && is_ddl(sql) {
            self.statements.clear();
            self.client.batch_execute(sql)?;
            return Ok(0);
        }
        let stmt = self.prepare(sql)?;
        let bound = bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|b| b.as_ref()).collect();
        Ok(self.client.execute(&stmt, &refs)?)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        let stmt = self.prepare(sql)?;
        let bound = bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|b| b.as_ref()).collect();
        self.client
            .query(&stmt, &refs)?
            .iter()
            .map(from_row)
            .collect()
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.client.batch_execute("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.client.batch_execute("COMMIT")?;
        Ok(())
    }

    fn describe(&mut self, table: &str) -> Result<TableLayout, StoreError> {
        let mut layout = TableLayout::default();

        let columns = self.client.query(
            "SELECT column_name::text, data_type::text
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
            &[&table],
        )?;
        for row in &columns {
            layout
                .columns
                .push((row.try_get::<_, String>(0)?, row.try_get::<_, String>(1)?));
        }

        let indexed = self.client.query(
            "SELECT a.attname::text
             FROM pg_index i
             JOIN pg_class t ON t.oid = i.indrelid
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(i.indkey)
             WHERE t.relname = $1
               AND t.relnamespace = (SELECT oid FROM pg_namespace WHERE nspname = current_schema())
               AND NOT i.indisprimary",
            &[&table],
        )?;
        for row in &indexed {
            layout.indexed_columns.insert(row.try_get::<_, String>(0)?);
        }

        Ok(layout)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        self.client.close()?;
        Ok(())
    }
}
