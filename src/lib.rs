//! Secondary Index Latency Benchmark
//!
//! Measures how a secondary index changes insert and query latency on a
//! relational table. Each run provisions its tables, bulk-loads synthetic
//! rows, times a fixed number of queries and prints summary statistics with
//! text charts.
//!
//! Two scenarios are built in:
//! - **Full scan**: `SELECT *` on two identical tables, one with an index
//! - **Point lookup**: `WHERE user_id = ?` before and after indexing `user_id`
//!
//! Stores: embedded SQLite (default, in memory) or a PostgreSQL server.
//!
//! Run: `cargo run --release`
//! Run tests: `cargo test`

pub mod chart;
pub mod config;
pub mod error;
pub mod logging;
pub mod populate;
pub mod report;
pub mod runner;
pub mod sample;
pub mod scenario;
pub mod schema;
pub mod store;
