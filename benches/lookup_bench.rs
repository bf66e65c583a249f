//! Criterion benchmark harness: point lookup latency on the `users` table with
//! and without an index on `user_id`, at several table sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use index_bench::populate::{RandomUsers, RowGenerator};
use index_bench::schema::{self, Dialect, TableSpec};
use index_bench::store::sqlite::SqliteStore;
use index_bench::store::{Store, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const SEED: u64 = 42;
const BATCH: u64 = 500;

/// Table sizes to benchmark.
fn table_sizes() -> Vec<(&'static str, u64)> {
    vec![("10k", 10_000), ("100k", 100_000)]
}

/// Create an in-memory SQLite table, optionally indexed, and fill it.
fn setup_store(spec: &TableSpec, rows: u64) -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().expect("Failed to open in-memory SQLite");
    store
        .execute(&spec.create_sql(Dialect::Sqlite), &[])
        .expect("Failed to create table");
    for column in &spec.indexed_columns {
        store
            .execute(&spec.create_index_sql(column), &[])
            .expect("Failed to create index");
    }

    let generator = RandomUsers::new(SEED, rows);
    store.begin().expect("Failed to begin");
    let mut next = 0;
    while next < rows {
        let n = (rows - next).min(BATCH);
        let params: Vec<Value> = (next..next + n).flat_map(|i| generator.row(i)).collect();
        store
            .execute(&spec.insert_sql(Dialect::Sqlite, n as usize), &params)
            .expect("Failed to populate");
        next += n;
    }
    store.commit().expect("Failed to commit");
    store
}

fn bench_lookup(c: &mut Criterion, group_name: &str, spec: TableSpec) {
    let mut group = c.benchmark_group(group_name);
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let sql = spec.point_lookup_sql(Dialect::Sqlite, "user_id");
    for (label, rows) in table_sizes() {
        let mut store = setup_store(&spec, rows);
        let mut rng = StdRng::seed_from_u64(SEED);

        group.bench_with_input(BenchmarkId::from_parameter(label), &rows, |b, &rows| {
            b.iter(|| {
                let v = rng.gen_range(1..=rows) as i64;
                store.query(&sql, &[Value::Int(v)]).expect("lookup failed")
            });
        });
    }
    group.finish();
}

fn bench_lookup_no_index(c: &mut Criterion) {
    bench_lookup(c, "lookup/no_index", schema::users());
}

fn bench_lookup_with_index(c: &mut Criterion) {
    bench_lookup(c, "lookup/with_index", schema::users().indexed("user_id"));
}

criterion_group!(benches, bench_lookup_no_index, bench_lookup_with_index);
criterion_main!(benches);
