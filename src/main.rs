//! Standalone benchmark runner that prints the formatted report.
//!
//! Configuration comes from `BENCH_*` environment variables, optionally set in
//! a `.env` file in the working directory:
//!
//!   BENCH_BACKEND       sqlite (default) | postgres
//!   BENCH_SCENARIO      full-scan (default) | point-lookup | all
//!   BENCH_ROWS          rows per table (scenario default when unset)
//!   BENCH_ITERATIONS    timed queries per table
//!   BENCH_DB_HOST / BENCH_DB_PORT / BENCH_DB_USER / BENCH_DB_PASSWORD / BENCH_DB_NAME
//!   BENCH_EXPORT_JSON   write samples and stats to this file
//!
//! Usage:
//!   cargo run --release
//!   BENCH_BACKEND=postgres BENCH_SCENARIO=all cargo run --release

use anyhow::Context;
use index_bench::config::{Backend, Config};
use index_bench::logging::initialize_logger;
use index_bench::scenario;
use std::io;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    initialize_logger(config.log_level, config.log_file.as_deref())
        .context("initializing logger")?;

    if let Some(path) = &config.env_file {
        log::info!("Loaded environment from {}", path.display());
    }
    log::info!(
        "Running {:?} benchmark against {}",
        config.scenario,
        match config.backend {
            Backend::Sqlite => format!("SQLite ({})", config.sqlite_path),
            Backend::Postgres => format!("PostgreSQL ({}:{})", config.host, config.port),
        }
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = scenario::run(&config, &mut out) {
        log::error!("Benchmark aborted: {e}");
        return Err(e).context("benchmark run failed");
    }

    log::info!("Benchmark complete");
    Ok(())
}
