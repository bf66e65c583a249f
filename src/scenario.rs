//! Canned end-to-end runs.
//!
//! | Scenario     | Tables                                | Query              | Defaults            |
//! |--------------|---------------------------------------|--------------------|---------------------|
//! | Full scan    | `numbers_no_index`, `numbers_with_index` | `SELECT *`      | 10,000 rows, 1 run  |
//! | Point lookup | `users`, indexed on `user_id` midway  | `WHERE user_id = ?` | 1,000,000 rows, 100 runs |

use crate::config::{Config, ScenarioKind};
use crate::error::{BenchError, BenchResult};
use crate::populate::{RandomUsers, SequentialValues};
use crate::runner::{QuerySpec, RunnerContext, StatsByGroup};
use crate::schema::{self, TableSpec};
use std::io::Write;

pub const FULL_SCAN_ROWS: u64 = 10_000;
pub const FULL_SCAN_ITERATIONS: u32 = 1;
pub const POINT_LOOKUP_ROWS: u64 = 1_000_000;
pub const POINT_LOOKUP_ITERATIONS: u32 = 100;

fn check_row_count(ctx: &mut RunnerContext, spec: &TableSpec, expected: u64) -> BenchResult<()> {
    let found = ctx.row_count(spec)?;
    if found != expected {
        return Err(BenchError::RowCount {
            table: spec.name.clone(),
            expected,
            found,
        });
    }
    log::debug!("{} holds {} rows", spec.name, found);
    Ok(())
}

/// Full scans of two identically populated tables, one with an index on
/// `value` and one without.
pub fn run_full_scan<W: Write>(
    ctx: &mut RunnerContext,
    rows: u64,
    iterations: u32,
    out: &mut W,
) -> BenchResult<StatsByGroup> {
    let (plain, indexed) = schema::numbers_pair();

    ctx.provision(&plain)?;
    ctx.provision(&indexed)?;

    for spec in [&plain, &indexed] {
        ctx.populate(spec, rows, &SequentialValues)?;
        check_row_count(ctx, spec, rows)?;
    }

    for spec in [&plain, &indexed] {
        ctx.measure_query(spec, &QuerySpec::FullScan, iterations)?;
    }

    let title = format!(
        "Full scan: {} vs {} ({} rows, {} iteration(s))",
        plain.name, indexed.name, rows, iterations
    );
    ctx.report(out, &title)
}

/// Point lookups on `users.user_id`, first without any index, then again
/// after indexing the column on the same populated table.
pub fn run_point_lookup<W: Write>(
    ctx: &mut RunnerContext,
    rows: u64,
    iterations: u32,
    seed: u64,
    out: &mut W,
) -> BenchResult<StatsByGroup> {
    let mut users = schema::users();
    let lookup = QuerySpec::point_lookup("user_id", rows);

    ctx.provision(&users)?;
    ctx.populate(&users, rows, &RandomUsers::new(seed, rows))?;
    check_row_count(ctx, &users, rows)?;

    ctx.measure_query(&users, &lookup, iterations)?;
    ctx.create_index(&mut users, "user_id")?;
    ctx.measure_query(&users, &lookup, iterations)?;

    let title = format!(
        "Point lookup: {}.user_id before and after indexing ({} rows, {} iterations)",
        users.name, rows, iterations
    );
    ctx.report(out, &title)
}

/// Run the configured scenario(s), each over its own connection.
pub fn run<W: Write>(config: &Config, out: &mut W) -> BenchResult<Vec<StatsByGroup>> {
    let kinds: &[ScenarioKind] = match config.scenario {
        ScenarioKind::FullScan => &[ScenarioKind::FullScan],
        ScenarioKind::PointLookup => &[ScenarioKind::PointLookup],
        ScenarioKind::All => &[ScenarioKind::FullScan, ScenarioKind::PointLookup],
    };

    let mut results = Vec::new();
    for kind in kinds {
        let mut ctx = RunnerContext::connect(config)?;
        let stats = match kind {
            ScenarioKind::PointLookup => run_point_lookup(
                &mut ctx,
                config.row_count.unwrap_or(POINT_LOOKUP_ROWS),
                config.iteration_count.unwrap_or(POINT_LOOKUP_ITERATIONS),
                config.seed,
                out,
            )?,
            _ => run_full_scan(
                &mut ctx,
                config.row_count.unwrap_or(FULL_SCAN_ROWS),
                config.iteration_count.unwrap_or(FULL_SCAN_ITERATIONS),
                out,
            )?,
        };
        ctx.close()?;
        results.push(stats);
    }
    Ok(results)
}
