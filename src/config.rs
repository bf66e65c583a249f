//! Run configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first (when present), so
//! credentials can live outside the shell history. Every variable is optional.

use crate::error::{BenchError, BenchResult};
use crate::store::sqlite::IN_MEMORY;
use log::LevelFilter;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SEED: u64 = 0xDEAD_BEEF_CAFE_1337;
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl FromStr for Backend {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(BenchError::Config(format!("unknown backend `{other}`"))),
        }
    }
}

/// Which canned end-to-end run to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Full scans of an indexed and a non-indexed table.
    FullScan,
    /// Point lookups on one table before and after indexing the lookup column.
    PointLookup,
    All,
}

impl FromStr for ScenarioKind {
    type Err = BenchError;

    fn from_str(s: &str) -> BenchResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full-scan" | "a" => Ok(ScenarioKind::FullScan),
            "point-lookup" | "b" => Ok(ScenarioKind::PointLookup),
            "all" => Ok(ScenarioKind::All),
            other => Err(BenchError::Config(format!("unknown scenario `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub sqlite_path: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
    pub scenario: ScenarioKind,
    /// Overrides the scenario's default row count.
    pub row_count: Option<u64>,
    /// Overrides the scenario's default iteration count.
    pub iteration_count: Option<u32>,
    pub batch_size: usize,
    pub seed: u64,
    pub export_path: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
    /// The `.env` file that was loaded, if any.
    pub env_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            sqlite_path: IN_MEMORY.to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "testing".to_string(),
            connect_timeout: Duration::from_secs(10),
            scenario: ScenarioKind::FullScan,
            row_count: None,
            iteration_count: None,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
            export_path: None,
            log_level: LevelFilter::Info,
            log_file: None,
            env_file: None,
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the `BENCH_*` variables.
    pub fn from_env() -> BenchResult<Self> {
        let env_file = dotenvy::dotenv().ok();
        let mut cfg = Self::from_lookup(|key| env::var(key).ok())?;
        cfg.env_file = env_file;
        Ok(cfg)
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> BenchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(v) = lookup("BENCH_BACKEND") {
            cfg.backend = v.parse()?;
        }
        if let Some(v) = lookup("BENCH_SQLITE_PATH") {
            cfg.sqlite_path = v;
        }
        if let Some(v) = lookup("BENCH_DB_HOST") {
            cfg.host = v;
        }
        if let Some(v) = lookup("BENCH_DB_PORT") {
            cfg.port = parse_number("BENCH_DB_PORT", &v)?;
        }
        if let Some(v) = lookup("BENCH_DB_USER") {
            cfg.user = v;
        }
        if let Some(v) = lookup("BENCH_DB_PASSWORD") {
            cfg.password = v;
        }
        if let Some(v) = lookup("BENCH_DB_NAME") {
            cfg.database = v;
        }
        if let Some(v) = lookup("BENCH_CONNECT_TIMEOUT_SECS") {
            cfg.connect_timeout =
                Duration::from_secs(parse_number("BENCH_CONNECT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("BENCH_SCENARIO") {
            cfg.scenario = v.parse()?;
        }
        if let Some(v) = lookup("BENCH_ROWS") {
            cfg.row_count = Some(parse_number("BENCH_ROWS", &v)?);
        }
        if let Some(v) = lookup("BENCH_ITERATIONS") {
            cfg.iteration_count = Some(parse_number("BENCH_ITERATIONS", &v)?);
        }
        if let Some(v) = lookup("BENCH_BATCH_SIZE") {
            cfg.batch_size = parse_number("BENCH_BATCH_SIZE", &v)?;
            if cfg.batch_size == 0 {
                return Err(BenchError::Config(
                    "BENCH_BATCH_SIZE must be at least 1".to_string(),
                ));
            }
        }
        if let Some(v) = lookup("BENCH_SEED") {
            cfg.seed = parse_number("BENCH_SEED", &v)?;
        }
        if let Some(v) = lookup("BENCH_EXPORT_JSON") {
            cfg.export_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("BENCH_LOG_LEVEL") {
            cfg.log_level = v
                .parse()
                .map_err(|_| BenchError::Config(format!("invalid BENCH_LOG_LEVEL `{v}`")))?;
        }
        if let Some(v) = lookup("BENCH_LOG_FILE") {
            cfg.log_file = Some(v);
        }

        Ok(cfg)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> BenchResult<T> {
    value
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|_| BenchError::Config(format!("invalid {key} `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.backend, Backend::Sqlite);
        assert_eq!(cfg.sqlite_path, IN_MEMORY);
        assert_eq!(cfg.scenario, ScenarioKind::FullScan);
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
        assert!(cfg.row_count.is_none());
    }

    #[test]
    fn reads_connection_and_counts() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("BENCH_BACKEND", "postgres"),
            ("BENCH_DB_HOST", "db.internal"),
            ("BENCH_DB_PORT", "6543"),
            ("BENCH_DB_USER", "bench"),
            ("BENCH_DB_NAME", "testing"),
            ("BENCH_SCENARIO", "point-lookup"),
            ("BENCH_ROWS", "1_000_000"),
            ("BENCH_ITERATIONS", "100"),
            ("BENCH_LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend, Backend::Postgres);
        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 6543);
        assert_eq!(cfg.user, "bench");
        assert_eq!(cfg.scenario, ScenarioKind::PointLookup);
        assert_eq!(cfg.row_count, Some(1_000_000));
        assert_eq!(cfg.iteration_count, Some(100));
        assert_eq!(cfg.log_level, LevelFilter::Debug);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup_from(&[("BENCH_ROWS", "lots")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("BENCH_BACKEND", "oracle")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("BENCH_BATCH_SIZE", "0")])).is_err());
    }
}
