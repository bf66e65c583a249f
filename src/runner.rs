//! Benchmark runner: owns the store connection and drives one run through
//! schema setup, population, timed measurement and reporting.
//!
//! The phases only move forward:
//!
//! ```text
//! Uninitialized -> SchemaReady -> Populated -> Measured -> Reported
//! ```
//!
//! An operation called from the wrong phase fails with [`BenchError::Phase`]
//! and leaves the phase unchanged. So does any store failure.

use crate::config::Config;
use crate::error::{BenchError, BenchResult, StoreError};
use crate::populate::RowGenerator;
use crate::report;
use crate::sample::{summarize_group, Operation, Sample, SampleSet, Stats, Variant};
use crate::schema::TableSpec;
use crate::store::{self, Store, TableLayout, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    SchemaReady,
    Populated,
    Measured,
    Reported,
}

/// The query timed by [`RunnerContext::measure_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpec {
    /// `SELECT *` with no predicate.
    FullScan,
    /// `SELECT * ... WHERE column = v`, `v` uniform in `1..=max_value`.
    PointLookup { column: String, max_value: u64 },
}

impl QuerySpec {
    pub fn point_lookup(column: &str, max_value: u64) -> Self {
        QuerySpec::PointLookup {
            column: column.to_string(),
            max_value,
        }
    }
}

pub type StatsByGroup = BTreeMap<(Operation, Variant), Stats>;

pub struct RunnerContext {
    store: Box<dyn Store>,
    phase: Phase,
    batch_size: usize,
    rng: StdRng,
    samples: SampleSet,
    export_path: Option<PathBuf>,
}

impl RunnerContext {
    pub fn new(store: Box<dyn Store>, batch_size: usize, seed: u64) -> Self {
        Self {
            store,
            phase: Phase::Uninitialized,
            batch_size: batch_size.max(1),
            rng: StdRng::seed_from_u64(seed),
            samples: SampleSet::new(),
            export_path: None,
        }
    }

    /// Connect to the configured store. On failure no context exists, so the
    /// run never leaves `Uninitialized`.
    pub fn connect(config: &Config) -> BenchResult<Self> {
        let store = store::connect(config)?;
        let mut ctx = Self::new(store, config.batch_size, config.seed);
        ctx.export_path = config.export_path.clone();
        Ok(ctx)
    }

    pub fn with_export_path(mut self, path: Option<PathBuf>) -> Self {
        self.export_path = path;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every sample recorded so far, in recording order.
    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    fn require(&self, operation: &'static str, allowed: &[Phase]) -> BenchResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(BenchError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn enter(&mut self, next: Phase) {
        if next != self.phase {
            log::debug!("Phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }

    /// Drop and recreate `spec`'s table, including its declared indexes.
    pub fn provision(&mut self, spec: &TableSpec) -> BenchResult<()> {
        self.require("provision", &[Phase::Uninitialized, Phase::SchemaReady])?;
        spec.validate()?;

        let dialect = self.store.dialect();
        log::info!(
            "Provisioning {} ({} columns, indexes on {:?})",
            spec.name,
            spec.columns.len(),
            spec.indexed_columns
        );

        self.store
            .execute(&spec.drop_sql(), &[])
            .map_err(|e| BenchError::ddl(&spec.name, e))?;
        self.store
            .execute(&spec.create_sql(dialect), &[])
            .map_err(|e| BenchError::ddl(&spec.name, e))?;
        for column in &spec.indexed_columns {
            self.store
                .execute(&spec.create_index_sql(column), &[])
                .map_err(|e| BenchError::ddl(&spec.name, e))?;
        }
        self.store
            .commit()
            .map_err(|e| BenchError::ddl(&spec.name, e))?;

        self.verify_layout(spec)?;
        self.enter(Phase::SchemaReady);
        Ok(())
    }

    fn verify_layout(&mut self, spec: &TableSpec) -> BenchResult<()> {
        let layout = self.describe(spec)?;
        log::debug!("{} layout: {:?}", spec.name, layout);

        let names: Vec<&str> = layout.columns.iter().map(|(n, _)| n.as_str()).collect();
        let expected: Vec<&str> = spec.columns.iter().map(|c| c.name.as_str()).collect();
        if names != expected {
            return Err(BenchError::schema(
                &spec.name,
                format!("store reports columns {names:?}, expected {expected:?}"),
            ));
        }
        if let Some(missing) = spec
            .indexed_columns
            .iter()
            .find(|c| !layout.indexed_columns.contains(*c))
        {
            return Err(BenchError::schema(
                &spec.name,
                format!("index on `{missing}` was not created"),
            ));
        }
        Ok(())
    }

    /// Insert `row_count` generated rows in batches inside one transaction.
    ///
    /// Returns the wall-clock time of the whole load and records it as an
    /// insert sample. A failed batch aborts the run; the transaction is left
    /// for the store to roll back when the connection goes away.
    pub fn populate(
        &mut self,
        spec: &TableSpec,
        row_count: u64,
        generator: &dyn RowGenerator,
    ) -> BenchResult<Duration> {
        self.require("populate", &[Phase::SchemaReady, Phase::Populated])?;

        let columns = spec.insertable_columns();
        if columns != generator.columns() {
            return Err(BenchError::schema(
                &spec.name,
                format!(
                    "generator fills {:?} but the table takes {:?}",
                    generator.columns(),
                    columns
                ),
            ));
        }

        let dialect = self.store.dialect();
        let rows_per_statement = dialect.rows_per_statement(self.batch_size, columns.len());
        if rows_per_statement < self.batch_size {
            log::debug!(
                "Batch size {} exceeds the {:?} parameter limit; using {} rows per INSERT",
                self.batch_size,
                dialect,
                rows_per_statement
            );
        }
        let batch = rows_per_statement as u64;
        let progress_step = (row_count / 10).max(batch);
        let mut params: Vec<Value> = Vec::with_capacity(rows_per_statement * columns.len());

        log::info!("Populating {} with {} rows", spec.name, row_count);
        let start = Instant::now();

        self.store
            .begin()
            .map_err(|e| BenchError::write(&spec.name, e))?;

        let mut next = 0u64;
        let mut last_report = 0u64;
        while next < row_count {
            let n = (row_count - next).min(batch);
            params.clear();
            for i in next..next + n {
                params.extend(generator.row(i));
            }
            let sql = spec.insert_sql(dialect, n as usize);
            self.store
                .execute(&sql, &params)
                .map_err(|e| BenchError::write(&spec.name, e))?;
            next += n;

            if next - last_report >= progress_step {
                log::debug!("  {}: {}/{} rows", spec.name, next, row_count);
                last_report = next;
            }
        }

        self.store
            .commit()
            .map_err(|e| BenchError::write(&spec.name, e))?;

        let elapsed = start.elapsed();
        self.samples
            .push(Sample::new(Operation::Insert, spec.variant(), elapsed));
        log::info!(
            "Populated {} in {:.4}s",
            spec.name,
            elapsed.as_secs_f64()
        );

        self.enter(Phase::Populated);
        Ok(elapsed)
    }

    /// The layout the store reports for `spec`'s table.
    pub fn describe(&mut self, spec: &TableSpec) -> BenchResult<TableLayout> {
        self.store
            .describe(&spec.name)
            .map_err(|e| BenchError::ddl(&spec.name, e))
    }

    /// `SELECT COUNT(*)` on the table.
    pub fn row_count(&mut self, spec: &TableSpec) -> BenchResult<u64> {
        let rows = self
            .store
            .query(&spec.count_sql(), &[])
            .map_err(|e| BenchError::query(&spec.name, e))?;
        match rows.first().and_then(|r| r.first()) {
            Some(Value::Int(n)) => Ok(*n as u64),
            other => Err(BenchError::query(
                &spec.name,
                StoreError::UnsupportedType(format!("COUNT(*) returned {other:?}")),
            )),
        }
    }

    /// Build a secondary index on an already populated table and add it to
    /// `spec`, so later samples are recorded as the indexed variant.
    pub fn create_index(&mut self, spec: &mut TableSpec, column: &str) -> BenchResult<Duration> {
        self.require("create_index", &[Phase::Populated, Phase::Measured])?;
        if !spec.has_column(column) {
            return Err(BenchError::schema(
                &spec.name,
                format!("cannot index unknown column `{column}`"),
            ));
        }

        let start = Instant::now();
        self.store
            .execute(&spec.create_index_sql(column), &[])
            .map_err(|e| BenchError::ddl(&spec.name, e))?;
        self.store
            .commit()
            .map_err(|e| BenchError::ddl(&spec.name, e))?;
        let elapsed = start.elapsed();

        // `spec` only changes once the store confirms the index.
        let mut indexed = spec.clone();
        indexed.indexed_columns.insert(column.to_string());
        self.verify_layout(&indexed)?;
        *spec = indexed;
        log::info!(
            "Indexed {}.{} in {:.4}s",
            spec.name,
            column,
            elapsed.as_secs_f64()
        );
        Ok(elapsed)
    }

    /// Time `iterations` executions of `query`, one after another.
    ///
    /// Each sample spans dispatch until every row is materialized.
    pub fn measure_query(
        &mut self,
        spec: &TableSpec,
        query: &QuerySpec,
        iterations: u32,
    ) -> BenchResult<SampleSet> {
        self.require("measure_query", &[Phase::Populated, Phase::Measured])?;

        let dialect = self.store.dialect();
        let sql = match query {
            QuerySpec::FullScan => spec.full_scan_sql(),
            QuerySpec::PointLookup { column, .. } => {
                if !spec.has_column(column) {
                    return Err(BenchError::schema(
                        &spec.name,
                        format!("cannot look up unknown column `{column}`"),
                    ));
                }
                spec.point_lookup_sql(dialect, column)
            }
        };
        let variant = spec.variant();
        log::info!(
            "Measuring {} x {} on {} ({})",
            iterations,
            sql,
            spec.name,
            variant
        );

        let mut set = SampleSet::new();
        for i in 0..iterations {
            let params = match query {
                QuerySpec::FullScan => Vec::new(),
                QuerySpec::PointLookup { max_value, .. } => {
                    let v = self.rng.gen_range(1..=(*max_value).max(1));
                    vec![Value::Int(v as i64)]
                }
            };

            let start = Instant::now();
            let rows = self
                .store
                .query(&sql, &params)
                .map_err(|e| BenchError::query(&spec.name, e))?;
            let elapsed = start.elapsed();

            log::trace!(
                "  {} #{}: {} rows in {:.6}s",
                spec.name,
                i,
                rows.len(),
                elapsed.as_secs_f64()
            );
            set.push(Sample::new(Operation::Query, variant, elapsed));
        }

        self.samples.extend(&set);
        self.enter(Phase::Measured);
        Ok(set)
    }

    /// Summarize every recorded group, write the report to `out` and export
    /// JSON when configured.
    pub fn report<W: Write>(&mut self, out: &mut W, title: &str) -> BenchResult<StatsByGroup> {
        self.require("report", &[Phase::Measured])?;

        let stats: StatsByGroup = self
            .samples
            .keys()
            .into_iter()
            .map(|(op, variant)| ((op, variant), summarize_group(&self.samples, op, variant)))
            .collect();

        report::print_report(out, title, &stats, &self.samples)?;
        if let Some(path) = &self.export_path {
            report::export_json(path, title, &stats, &self.samples)?;
            log::info!("Exported results to {}", path.display());
        }

        self.enter(Phase::Reported);
        Ok(stats)
    }

    /// Release the connection.
    pub fn close(self) -> BenchResult<()> {
        self.store.close().map_err(BenchError::Connection)
    }
}
