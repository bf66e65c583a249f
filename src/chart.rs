//! Text charts for the report: box plot, time series with a least-squares
//! trend line, and histogram. All values are elapsed seconds.

use crate::sample::percentile;
use std::io::{self, Write};

const LABEL_WIDTH: usize = 28;

/// Least-squares fit `y = slope * x + intercept` over `x = 0..n`.
///
/// Fewer than two points give a flat line through the only value (or zero).
pub fn trend_line(values: &[f64]) -> (f64, f64) {
    match values.len() {
        0 => (0.0, 0.0),
        1 => (0.0, values[0]),
        n => {
            let n_f = n as f64;
            let mean_x = (n_f - 1.0) / 2.0;
            let mean_y = values.iter().sum::<f64>() / n_f;
            let mut num = 0.0;
            let mut den = 0.0;
            for (i, y) in values.iter().enumerate() {
                let dx = i as f64 - mean_x;
                num += dx * (y - mean_y);
                den += dx * dx;
            }
            let slope = num / den;
            (slope, mean_y - slope * mean_x)
        }
    }
}

/// Equal-width buckets spanning `[min, max]`: `(lower, upper, count)`.
pub fn bucket_counts(values: &[f64], buckets: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi <= lo {
        return vec![(lo, hi, values.len())];
    }

    let step = (hi - lo) / buckets as f64;
    let mut counts = vec![0usize; buckets];
    for v in values {
        let idx = (((v - lo) / step) as usize).min(buckets - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (lo + step * i as f64, lo + step * (i + 1) as f64, c))
        .collect()
}

fn scale(v: f64, lo: f64, hi: f64, width: usize) -> usize {
    if hi <= lo || width < 2 {
        return 0;
    }
    (((v - lo) / (hi - lo)) * (width - 1) as f64)
        .round()
        .clamp(0.0, (width - 1) as f64) as usize
}

/// One box-plot row on the shared axis `[lo, hi]`:
/// `-` whiskers, `[`/`]` quartiles, `|` median.
pub fn box_plot_line(values: &[f64], lo: f64, hi: f64, width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let min = scale(sorted[0], lo, hi, width);
    let q1 = scale(percentile(&sorted, 25.0), lo, hi, width);
    let med = scale(percentile(&sorted, 50.0), lo, hi, width);
    let q3 = scale(percentile(&sorted, 75.0), lo, hi, width);
    let max = scale(sorted[sorted.len() - 1], lo, hi, width);

    let mut cells = vec![' '; width];
    for c in &mut cells[min..=max] {
        *c = '-';
    }
    for c in &mut cells[q1..=q3] {
        *c = '=';
    }
    cells[q1] = '[';
    cells[q3] = ']';
    cells[med] = '|';

    cells.into_iter().collect::<String>().trim_end().to_string()
}

pub fn print_box_plot<W: Write>(
    out: &mut W,
    title: &str,
    groups: &[(String, Vec<f64>)],
    width: usize,
) -> io::Result<()> {
    let all = groups.iter().flat_map(|(_, v)| v.iter().copied());
    let lo = all.clone().fold(f64::INFINITY, f64::min);
    let hi = all.fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return Ok(());
    }

    writeln!(out, "\n  Box plot: {title} (seconds, {lo:.6} .. {hi:.6}):")?;
    for (label, values) in groups {
        writeln!(
            out,
            "  {:<w$} {}",
            label,
            box_plot_line(values, lo, hi, width),
            w = LABEL_WIDTH
        )?;
    }
    Ok(())
}

/// Samples in order, downsampled by averaging to at most `max_points` rows.
/// `#` bars are the samples, `+` marks the trend line.
pub fn print_time_series<W: Write>(
    out: &mut W,
    label: &str,
    values: &[f64],
    max_points: usize,
    width: usize,
) -> io::Result<()> {
    if values.len() < 2 || max_points == 0 {
        return Ok(());
    }
    let (slope, intercept) = trend_line(values);
    let chunk = values.len().div_ceil(max_points);
    let hi = values.iter().copied().fold(0.0, f64::max);

    writeln!(
        out,
        "\n  Time series: {label} (trend {slope:+.3e} s/iteration)"
    )?;
    for (i, part) in values.chunks(chunk).enumerate() {
        let first = i * chunk;
        let avg = part.iter().sum::<f64>() / part.len() as f64;
        let mid = first as f64 + (part.len() - 1) as f64 / 2.0;
        let trend = slope * mid + intercept;

        let mut cells = vec![' '; width];
        let bar = scale(avg, 0.0, hi, width);
        for c in &mut cells[..=bar] {
            *c = '#';
        }
        cells[scale(trend.max(0.0), 0.0, hi, width)] = '+';
        writeln!(
            out,
            "  {:>5} {} {:.6}",
            first,
            cells.into_iter().collect::<String>(),
            avg
        )?;
    }
    Ok(())
}

pub fn print_histogram<W: Write>(
    out: &mut W,
    label: &str,
    values: &[f64],
    buckets: usize,
    width: usize,
) -> io::Result<()> {
    if values.len() < 2 {
        return Ok(());
    }
    let counts = bucket_counts(values, buckets);
    let peak = counts.iter().map(|(_, _, c)| *c).max().unwrap_or(0).max(1);

    writeln!(out, "\n  Histogram: {label}")?;
    for (lower, upper, count) in counts {
        let bar = "#".repeat(count * width / peak);
        writeln!(out, "  {lower:>10.6} - {upper:>10.6} {count:>6} {bar}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_of_linear_series() {
        let (slope, intercept) = trend_line(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trend_of_short_series_is_flat() {
        assert_eq!(trend_line(&[]), (0.0, 0.0));
        assert_eq!(trend_line(&[0.5]), (0.0, 0.5));
    }

    #[test]
    fn buckets_cover_every_value() {
        let values = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 1.0];
        let counts = bucket_counts(&values, 4);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.iter().map(|(_, _, c)| c).sum::<usize>(), values.len());
        assert_eq!(counts[0].0, 0.0);
        assert_eq!(counts[3].1, 1.0);
    }

    #[test]
    fn identical_values_land_in_one_bucket() {
        assert_eq!(bucket_counts(&[0.2, 0.2, 0.2], 5), vec![(0.2, 0.2, 3)]);
    }

    #[test]
    fn box_plot_marks_quartiles_and_median() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let line = box_plot_line(&values, 0.0, 4.0, 9);
        assert_eq!(line, "--[=|=]--");
    }

    #[test]
    fn charts_render_without_panicking_on_small_inputs() {
        let mut out = Vec::new();
        print_box_plot(&mut out, "a", &[("a".to_string(), vec![0.1])], 40).unwrap();
        print_time_series(&mut out, "a", &[0.1, 0.2, 0.15], 40, 40).unwrap();
        print_histogram(&mut out, "a", &[0.1, 0.1], 10, 40).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Box plot: a"));
        assert!(text.contains("Time series: a"));
        assert!(text.contains("Histogram: a"));
    }
}
