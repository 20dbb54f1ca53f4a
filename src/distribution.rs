//! Distribution summaries
//!
//! Describe-style statistics and fixed-width histogram bins for a numeric
//! column. Non-finite values are ignored.

use crate::error::AnalysisError;
use crate::grouping::sample_std_dev;
use crate::types::{Describe, DistributionReport, HistogramBin};

/// Upper bound on bins per histogram
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Summary statistics with linearly interpolated quartiles
pub fn describe(values: &[f64]) -> Option<Describe> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;

    Some(Describe {
        count: n,
        mean,
        std_dev: sample_std_dev(&sorted, mean),
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Bin values into contiguous bins aligned on multiples of `bin_width`.
///
/// Bins are half-open `[lower, upper)`; the last bin also holds its upper edge.
pub fn histogram(values: &[f64], bin_width: f64) -> Result<Vec<HistogramBin>, AnalysisError> {
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(AnalysisError::InvalidConfig(format!(
            "histogram bin width must be positive, got {}",
            bin_width
        )));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (min, max) = match finite.iter().copied().fold(None, |acc: Option<(f64, f64)>, v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    }) {
        Some(bounds) => bounds,
        None => return Ok(Vec::new()),
    };

    let start = (min / bin_width).floor() * bin_width;
    let span = ((max - start) / bin_width).ceil();
    if span > MAX_HISTOGRAM_BINS as f64 {
        return Err(AnalysisError::ValueRange(format!(
            "values from {} to {} need more than {} bins of width {}",
            min, max, MAX_HISTOGRAM_BINS, bin_width
        )));
    }
    let bin_count = (span as usize).max(1);

    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: start + i as f64 * bin_width,
            upper: start + (i + 1) as f64 * bin_width,
            count: 0,
        })
        .collect();

    for v in finite {
        let index = (((v - start) / bin_width).floor() as usize).min(bin_count - 1);
        bins[index].count += 1;
    }

    Ok(bins)
}

/// Summary and histogram of one column.
///
/// A value range too wide to bin leaves the histogram empty and records why;
/// the summary is still computed.
pub fn distribution_report(
    column: &str,
    values: &[f64],
    bin_width: f64,
) -> Result<DistributionReport, AnalysisError> {
    let (histogram, histogram_unavailable) = match histogram(values, bin_width) {
        Ok(bins) => (bins, None),
        Err(AnalysisError::ValueRange(reason)) => {
            tracing::warn!(column, %reason, "histogram unavailable");
            (Vec::new(), Some(reason))
        }
        Err(e) => return Err(e),
    };

    Ok(DistributionReport {
        column: column.to_string(),
        bin_width,
        summary: describe(values),
        histogram,
        histogram_unavailable,
    })
}
