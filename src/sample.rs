//! Timing samples and their summary statistics.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    NonIndexed,
    Indexed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert => write!(f, "Insert"),
            Operation::Query => write!(f, "Retrieval"),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::NonIndexed => write!(f, "Without Index"),
            Variant::Indexed => write!(f, "With Index"),
        }
    }
}

/// One timed operation. Never mutated after it is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub operation: Operation,
    pub variant: Variant,
    pub elapsed_seconds: f64,
}

impl Sample {
    pub fn new(operation: Operation, variant: Variant, elapsed: Duration) -> Self {
        Self {
            operation,
            variant,
            elapsed_seconds: elapsed.as_secs_f64(),
        }
    }
}

/// Samples in recording order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn extend(&mut self, other: &SampleSet) {
        self.samples.extend_from_slice(&other.samples);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Elapsed seconds of one `(operation, variant)` group, in recording order.
    pub fn group(&self, operation: Operation, variant: Variant) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| s.operation == operation && s.variant == variant)
            .map(|s| s.elapsed_seconds)
            .collect()
    }

    /// Distinct groups present, sorted by operation then variant.
    pub fn keys(&self) -> Vec<(Operation, Variant)> {
        let mut keys: Vec<(Operation, Variant)> = self
            .samples
            .iter()
            .map(|s| (s.operation, s.variant))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p95: f64,
}

/// Aggregate a group of elapsed times. An empty group yields all zeros.
pub fn summarize(values: &[f64]) -> Stats {
    if values.is_empty() {
        return Stats::default();
    }

    let n = values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Rounding in the sum can push the mean just outside [min, max].
    let mean = (values.iter().sum::<f64>() / n).clamp(min, max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Stats {
        count: values.len(),
        mean,
        min,
        max,
        stddev: variance.sqrt(),
        p50: percentile(&sorted, 50.0),
        p95: percentile(&sorted, 95.0),
    }
}

/// Percentile over an already sorted slice: the element at the rounded
/// linear rank `pct / 100 * (n - 1)`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Convenience for a whole [`SampleSet`] group.
pub fn summarize_group(set: &SampleSet, operation: Operation, variant: Variant) -> Stats {
    summarize(&set.group(operation, variant))
}
