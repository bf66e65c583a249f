//! Report module: prints the elapsed-time comparison, per-group statistics and
//! text charts, and optionally exports everything as JSON.

use crate::chart;
use crate::error::BenchResult;
use crate::runner::StatsByGroup;
use crate::sample::{Operation, SampleSet, Stats, Variant};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const CHART_WIDTH: usize = 50;
const HISTOGRAM_BUCKETS: usize = 10;
const MAX_SERIES_POINTS: usize = 25;

/// The one-line summary for a group, e.g. `Retrieval Time Without Index: 0.0123 seconds`.
pub fn elapsed_line(operation: Operation, variant: Variant, stats: &Stats) -> String {
    if stats.count == 1 {
        format!("{operation} Time {variant}: {:.4} seconds", stats.mean)
    } else {
        format!(
            "{operation} Time {variant}: {:.4} seconds (mean of {})",
            stats.mean, stats.count
        )
    }
}

/// Mean of the indexed variant relative to the non-indexed one.
pub fn index_ratio(stats: &StatsByGroup, operation: Operation) -> Option<f64> {
    let plain = stats.get(&(operation, Variant::NonIndexed))?;
    let indexed = stats.get(&(operation, Variant::Indexed))?;
    if plain.mean <= 0.0 {
        return None;
    }
    Some(indexed.mean / plain.mean)
}

pub fn print_report<W: Write>(
    out: &mut W,
    title: &str,
    stats: &StatsByGroup,
    samples: &SampleSet,
) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(80))?;
    writeln!(out, "  {title}")?;
    writeln!(out, "{}", "=".repeat(80))?;

    for ((op, variant), s) in stats {
        if *op == Operation::Query {
            writeln!(out, "{}", elapsed_line(*op, *variant, s))?;
        }
    }

    let loads: Vec<(&Variant, &Stats)> = stats
        .iter()
        .filter(|((op, _), _)| *op == Operation::Insert)
        .map(|((_, variant), s)| (variant, s))
        .collect();
    if !loads.is_empty() {
        writeln!(out, "\n  Population:")?;
        for (variant, s) in loads {
            writeln!(out, "    {variant}: loaded in {:.4}s", s.mean)?;
        }
    }

    for ((op, variant), s) in stats {
        writeln!(out, "\n  {op} / {variant}")?;
        writeln!(out, "  {}", "-".repeat(60))?;
        writeln!(out, "  Samples:         {:>10}", s.count)?;
        writeln!(
            out,
            "  Mean:            {:>10.6}s  ({:.3}ms)",
            s.mean,
            s.mean * 1e3
        )?;
        writeln!(out, "  Min:             {:>10.6}s", s.min)?;
        writeln!(out, "  Max:             {:>10.6}s", s.max)?;
        writeln!(out, "  Std dev:         {:>10.6}s", s.stddev)?;
        writeln!(out, "  p50:             {:>10.6}s", s.p50)?;
        writeln!(out, "  p95:             {:>10.6}s", s.p95)?;
    }

    let comparisons: Vec<(Operation, f64)> = [Operation::Insert, Operation::Query]
        .into_iter()
        .filter_map(|op| index_ratio(stats, op).map(|r| (op, r)))
        .collect();
    if !comparisons.is_empty() {
        writeln!(out, "\n  Comparison (with index vs without):")?;
        writeln!(out, "  {:12} {:>10} {:>10}", "Operation", "Ratio", "Change")?;
        writeln!(out, "  {}", "-".repeat(34))?;
        for (op, ratio) in comparisons {
            writeln!(
                out,
                "  {:12} {:>9.2}x {:>+9.1}%",
                op.to_string(),
                ratio,
                (ratio - 1.0) * 100.0
            )?;
        }
    }

    let groups: Vec<(String, Vec<f64>)> = stats
        .keys()
        .map(|(op, variant)| (format!("{op} / {variant}"), samples.group(*op, *variant)))
        .collect();
    // One axis per operation.
    for op in [Operation::Insert, Operation::Query] {
        let same_op: Vec<(String, Vec<f64>)> = stats
            .keys()
            .filter(|(o, _)| *o == op)
            .map(|(o, variant)| (format!("{o} / {variant}"), samples.group(*o, *variant)))
            .collect();
        chart::print_box_plot(out, &op.to_string(), &same_op, CHART_WIDTH)?;
    }
    for (label, values) in &groups {
        chart::print_time_series(out, label, values, MAX_SERIES_POINTS, CHART_WIDTH)?;
        chart::print_histogram(out, label, values, HISTOGRAM_BUCKETS, CHART_WIDTH / 2)?;
    }

    writeln!(out, "\n{}", "=".repeat(80))?;
    Ok(())
}

#[derive(Serialize)]
struct GroupExport {
    operation: Operation,
    variant: Variant,
    stats: Stats,
}

#[derive(Serialize)]
struct Export<'a> {
    title: &'a str,
    groups: Vec<GroupExport>,
    samples: &'a SampleSet,
}

/// Write stats and raw samples as pretty JSON to `path`.
pub fn export_json(
    path: &Path,
    title: &str,
    stats: &StatsByGroup,
    samples: &SampleSet,
) -> BenchResult<()> {
    let export = Export {
        title,
        groups: stats
            .iter()
            .map(|((operation, variant), s)| GroupExport {
                operation: *operation,
                variant: *variant,
                stats: *s,
            })
            .collect(),
        samples,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &export)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{summarize, Sample};
    use std::time::Duration;

    fn stats_of(entries: &[(Operation, Variant, Vec<f64>)]) -> (StatsByGroup, SampleSet) {
        let mut set = SampleSet::new();
        let mut stats = StatsByGroup::new();
        for (op, variant, values) in entries {
            for v in values {
                set.push(Sample::new(*op, *variant, Duration::from_secs_f64(*v)));
            }
            stats.insert((*op, *variant), summarize(values));
        }
        (stats, set)
    }

    #[test]
    fn elapsed_line_matches_console_format() {
        let s = summarize(&[0.01234]);
        assert_eq!(
            elapsed_line(Operation::Query, Variant::NonIndexed, &s),
            "Retrieval Time Without Index: 0.0123 seconds"
        );
        let s = summarize(&[0.5, 1.5]);
        assert_eq!(
            elapsed_line(Operation::Query, Variant::Indexed, &s),
            "Retrieval Time With Index: 1.0000 seconds (mean of 2)"
        );
    }

    #[test]
    fn ratio_needs_both_variants() {
        let (stats, _) = stats_of(&[
            (Operation::Query, Variant::NonIndexed, vec![0.4]),
            (Operation::Query, Variant::Indexed, vec![0.1]),
            (Operation::Insert, Variant::NonIndexed, vec![1.0]),
        ]);
        assert_eq!(index_ratio(&stats, Operation::Query), Some(0.25));
        assert_eq!(index_ratio(&stats, Operation::Insert), None);
    }

    #[test]
    fn report_prints_elapsed_lines_for_queries_only() {
        let (stats, set) = stats_of(&[
            (Operation::Insert, Variant::NonIndexed, vec![2.5]),
            (Operation::Insert, Variant::Indexed, vec![3.2]),
            (Operation::Query, Variant::NonIndexed, vec![0.4, 0.5, 0.3]),
            (Operation::Query, Variant::Indexed, vec![0.1, 0.2, 0.1]),
        ]);
        let mut out = Vec::new();
        print_report(&mut out, "test", &stats, &set).unwrap();
        let text = String::from_utf8(out).unwrap();

        let elapsed: Vec<&str> = text
            .lines()
            .filter(|l| l.contains(" Time ") && l.contains(" seconds"))
            .collect();
        assert_eq!(elapsed.len(), 2, "report was:\n{text}");
        assert!(elapsed.iter().all(|l| l.starts_with("Retrieval Time")));
        assert!(text.contains("Population:"));
        assert!(text.contains("Without Index: loaded in 2.5000s"));
        assert!(text.contains("Comparison (with index vs without)"));
        assert!(text.contains("Histogram: Retrieval / With Index"));
    }

    #[test]
    fn box_plots_use_one_axis_per_operation() {
        let (stats, set) = stats_of(&[
            (Operation::Insert, Variant::NonIndexed, vec![0.0032]),
            (Operation::Query, Variant::NonIndexed, vec![0.0006, 0.0008, 0.001]),
            (Operation::Query, Variant::Indexed, vec![0.0007, 0.0009]),
        ]);
        let mut out = Vec::new();
        print_report(&mut out, "test", &stats, &set).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Box plot: Retrieval (seconds, 0.000600 .. 0.001000)"));
        assert!(text.contains("Box plot: Insert (seconds, 0.003200 .. 0.003200)"));
    }
}
