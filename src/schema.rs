//! Table specifications and the SQL rendered from them.
//!
//! A benchmark compares two tables that are identical except for their
//! secondary indexes. [`TableSpec::variant_pair`] is the only way the canned
//! specs build such pairs, so the column lists can never drift apart.

use crate::error::{BenchError, BenchResult};
use crate::sample::Variant;
use std::collections::BTreeSet;

/// SQL flavour spoken by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Positional placeholder for the 1-based parameter `n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{n}"),
            Dialect::Postgres => format!("${n}"),
        }
    }

    /// Most bind parameters one statement may carry.
    pub fn max_params(&self) -> usize {
        match self {
            Dialect::Sqlite => 32_766,
            Dialect::Postgres => 65_535,
        }
    }

    /// Rows of `width` parameters each that fit in one statement, capped at `wanted`.
    pub fn rows_per_statement(&self, wanted: usize, width: usize) -> usize {
        wanted.min(self.max_params() / width.max(1)).max(1)
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match (self, ty) {
            (Dialect::Sqlite, ColumnType::BigInt) => "INTEGER",
            (Dialect::Postgres, ColumnType::BigInt) => "BIGINT",
            (_, ColumnType::Text) => "TEXT",
        }
    }

    fn primary_key(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    /// Store-generated key; never supplied by a row generator.
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub indexed_columns: BTreeSet<String>,
}

impl TableSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexed_columns: BTreeSet::new(),
        }
    }

    pub fn primary_key(mut self, name: &str) -> Self {
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            ty: ColumnType::BigInt,
            primary_key: true,
        });
        self
    }

    pub fn column(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            ty,
            primary_key: false,
        });
        self
    }

    pub fn indexed(mut self, column: &str) -> Self {
        self.indexed_columns.insert(column.to_string());
        self
    }

    /// Build the non-indexed and indexed tables from one column layout.
    ///
    /// Both specs share `base.columns` exactly; only the names and
    /// `indexed_columns` differ.
    pub fn variant_pair(
        base: &TableSpec,
        plain_name: &str,
        indexed_name: &str,
        index_on: &[&str],
    ) -> (TableSpec, TableSpec) {
        let plain = TableSpec {
            name: plain_name.to_string(),
            columns: base.columns.clone(),
            indexed_columns: BTreeSet::new(),
        };
        let indexed = TableSpec {
            name: indexed_name.to_string(),
            columns: base.columns.clone(),
            indexed_columns: index_on.iter().map(|c| c.to_string()).collect(),
        };
        (plain, indexed)
    }

    pub fn variant(&self) -> Variant {
        if self.indexed_columns.is_empty() {
            Variant::NonIndexed
        } else {
            Variant::Indexed
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Columns a row generator must supply, in declaration order.
    pub fn insertable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Reject specs the store would only partially apply.
    pub fn validate(&self) -> BenchResult<()> {
        if self.name.is_empty() || !is_identifier(&self.name) {
            return Err(BenchError::schema(&self.name, "invalid table name"));
        }
        if self.columns.is_empty() {
            return Err(BenchError::schema(&self.name, "table has no columns"));
        }
        let mut seen = BTreeSet::new();
        for col in &self.columns {
            if !is_identifier(&col.name) {
                return Err(BenchError::schema(
                    &self.name,
                    format!("invalid column name `{}`", col.name),
                ));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(BenchError::schema(
                    &self.name,
                    format!("duplicate column `{}`", col.name),
                ));
            }
        }
        if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(BenchError::schema(&self.name, "more than one primary key"));
        }
        for idx in &self.indexed_columns {
            if !self.has_column(idx) {
                return Err(BenchError::schema(
                    &self.name,
                    format!("indexed column `{idx}` is not declared"),
                ));
            }
        }
        Ok(())
    }

    pub fn index_name(&self, column: &str) -> String {
        format!("idx_{}_{}", self.name, column)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    pub fn create_sql(&self, dialect: Dialect) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.primary_key {
                    format!("{} {}", c.name, dialect.primary_key())
                } else {
                    format!("{} {}", c.name, dialect.column_type(c.ty))
                }
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.name, cols.join(", "))
    }

    pub fn create_index_sql(&self, column: &str) -> String {
        format!(
            "CREATE INDEX {} ON {} ({})",
            self.index_name(column),
            self.name,
            column
        )
    }

    /// Multi-row parameterized insert for `rows` rows of the insertable columns.
    pub fn insert_sql(&self, dialect: Dialect, rows: usize) -> String {
        let cols = self.insertable_columns();
        let width = cols.len();
        let tuples: Vec<String> = (0..rows)
            .map(|r| {
                let slots: Vec<String> = (0..width)
                    .map(|c| dialect.placeholder(r * width + c + 1))
                    .collect();
                format!("({})", slots.join(", "))
            })
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.name,
            cols.join(", "),
            tuples.join(", ")
        )
    }

    pub fn full_scan_sql(&self) -> String {
        format!("SELECT * FROM {}", self.name)
    }

    pub fn point_lookup_sql(&self, dialect: Dialect, column: &str) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = {}",
            self.name,
            column,
            dialect.placeholder(1)
        )
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `numbers_no_index` / `numbers_with_index`: `(id, value)`, index on `value`.
pub fn numbers_pair() -> (TableSpec, TableSpec) {
    let base = TableSpec::new("numbers")
        .primary_key("id")
        .column("value", ColumnType::BigInt);
    TableSpec::variant_pair(&base, "numbers_no_index", "numbers_with_index", &["value"])
}

/// `users`: `(id, user_id, name)`, provisioned without any secondary index.
pub fn users() -> TableSpec {
    TableSpec::new("users")
        .primary_key("id")
        .column("user_id", ColumnType::BigInt)
        .column("name", ColumnType::Text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_pair_shares_columns() {
        let (plain, indexed) = numbers_pair();
        assert_eq!(plain.columns, indexed.columns);
        assert!(plain.indexed_columns.is_empty());
        assert!(indexed.indexed_columns.contains("value"));
        assert_eq!(plain.variant(), Variant::NonIndexed);
        assert_eq!(indexed.variant(), Variant::Indexed);
    }

    #[test]
    fn insert_sql_numbers_placeholders_per_dialect() {
        let spec = users();
        assert_eq!(
            spec.insert_sql(Dialect::Sqlite, 2),
            "INSERT INTO users (user_id, name) VALUES (?1, ?2), (?3, ?4)"
        );
        assert_eq!(
            spec.insert_sql(Dialect::Postgres, 1),
            "INSERT INTO users (user_id, name) VALUES ($1, $2)"
        );
    }

    #[test]
    fn rows_per_statement_respects_parameter_limit() {
        assert_eq!(Dialect::Sqlite.rows_per_statement(500, 2), 500);
        assert_eq!(Dialect::Sqlite.rows_per_statement(20_000, 2), 16_383);
        assert_eq!(Dialect::Postgres.rows_per_statement(100_000, 1), 65_535);
        assert_eq!(Dialect::Sqlite.rows_per_statement(0, 2), 1);
    }

    #[test]
    fn create_sql_renders_primary_key() {
        let (plain, _) = numbers_pair();
        assert_eq!(
            plain.create_sql(Dialect::Sqlite),
            "CREATE TABLE numbers_no_index (id INTEGER PRIMARY KEY, value INTEGER)"
        );
        assert_eq!(
            plain.create_sql(Dialect::Postgres),
            "CREATE TABLE numbers_no_index (id BIGSERIAL PRIMARY KEY, value BIGINT)"
        );
    }

    #[test]
    fn validate_rejects_unknown_index_column() {
        let spec = users().indexed("email");
        assert!(matches!(
            spec.validate(),
            Err(BenchError::Schema { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_columns_and_bad_names() {
        let dup = TableSpec::new("t")
            .column("a", ColumnType::BigInt)
            .column("a", ColumnType::Text);
        assert!(dup.validate().is_err());

        let bad = TableSpec::new("t; DROP").column("a", ColumnType::BigInt);
        assert!(bad.validate().is_err());

        assert!(users().validate().is_ok());
    }
}
