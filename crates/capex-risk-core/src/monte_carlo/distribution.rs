//! Distributional summary of simulated present values.
//!
//! Every summary is rebuilt from scratch for each outcome vector. An empty
//! vector yields `None` instead of an error: an unrun simulation is a
//! normal state for a caller to display.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Histogram bin count used by [`summarize`].
pub const HISTOGRAM_BINS: usize = 20;
/// CDF sample points used by [`summarize`] (every 5%).
pub const CDF_POINTS: usize = 21;

/// Percentile summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// A single histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// One point on the empirical CDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
    pub value: f64,
    pub cumulative_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
    /// Share of outcomes strictly above zero, in percent.
    pub probability_positive: f64,
    /// Mean minus P10: how far a bad-decile outcome falls below expectation.
    pub downside_p10_gap: f64,
    pub histogram: Vec<HistogramBin>,
    pub cdf: Vec<CdfPoint>,
}

fn sorted_copy(outcomes: &[f64]) -> Vec<f64> {
    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile from a **sorted** slice using linear interpolation between
/// the two nearest ranks (`idx = p/100 × (n-1)`). `p` is clamped to
/// `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        Some(sorted[lower])
    } else {
        let frac = rank - lower as f64;
        Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
    }
}

/// Percentile of an unsorted outcome vector.
pub fn percentile(outcomes: &[f64], p: f64) -> Option<f64> {
    percentile_sorted(&sorted_copy(outcomes), p)
}

/// `bin_count` equal-width bins spanning `[min, max]`.
///
/// A zero span uses width 1 so every value lands in bin 0. Empty input or
/// zero bins produce no bins.
pub fn histogram(outcomes: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    if outcomes.is_empty() || bin_count == 0 {
        return Vec::new();
    }

    let min_val = outcomes.iter().copied().fold(f64::INFINITY, f64::min);
    let max_val = outcomes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max_val - min_val;
    let bin_width = if span > 0.0 {
        span / bin_count as f64
    } else {
        1.0
    };

    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| {
            let lower = min_val + i as f64 * bin_width;
            let upper = if i == bin_count - 1 && span > 0.0 {
                max_val
            } else {
                lower + bin_width
            };
            HistogramBin {
                lower,
                upper,
                count: 0,
                frequency: 0.0,
            }
        })
        .collect();

    for &val in outcomes {
        let raw = ((val - min_val) / bin_width).floor();
        let idx = if raw < 0.0 {
            0
        } else {
            (raw as usize).min(bin_count - 1)
        };
        bins[idx].count += 1;
    }

    let n = outcomes.len() as f64;
    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }

    bins
}

/// Empirical CDF sampled at `point_count` evenly spaced ranks.
///
/// Point `i` takes rank `floor(i/(points-1) × (n-1))` with probability
/// `rank/(n-1)`. A single point reports the maximum at probability 1, and
/// a single outcome always has probability 1.
pub fn cdf_sample(outcomes: &[f64], point_count: usize) -> Vec<CdfPoint> {
    if outcomes.is_empty() || point_count == 0 {
        return Vec::new();
    }

    let sorted = sorted_copy(outcomes);
    let last = sorted.len() - 1;

    if point_count == 1 {
        return vec![CdfPoint {
            value: sorted[last],
            cumulative_probability: 1.0,
        }];
    }

    (0..point_count)
        .map(|i| {
            let fraction = i as f64 / (point_count - 1) as f64;
            let rank = ((fraction * last as f64).floor() as usize).min(last);
            let cumulative_probability = if last == 0 {
                1.0
            } else {
                rank as f64 / last as f64
            };
            CdfPoint {
                value: sorted[rank],
                cumulative_probability,
            }
        })
        .collect()
}

/// Percentage of outcomes strictly greater than zero.
pub fn probability_positive(outcomes: &[f64]) -> Option<f64> {
    if outcomes.is_empty() {
        return None;
    }
    let positive = outcomes.iter().filter(|v| **v > 0.0).count();
    Some(positive as f64 / outcomes.len() as f64 * 100.0)
}

/// Full summary; `None` for an empty outcome vector.
pub fn summarize(outcomes: &[f64]) -> Option<DistributionSummary> {
    if outcomes.is_empty() {
        return None;
    }

    let sorted = sorted_copy(outcomes);
    let mean = outcomes.iter().mean();
    let std_dev = if outcomes.len() > 1 {
        outcomes.iter().population_std_dev()
    } else {
        0.0
    };

    let pct = |p: f64| percentile_sorted(&sorted, p).unwrap_or(f64::NAN);
    let percentiles = Percentiles {
        p5: pct(5.0),
        p10: pct(10.0),
        p25: pct(25.0),
        p50: pct(50.0),
        p75: pct(75.0),
        p90: pct(90.0),
        p95: pct(95.0),
    };

    Some(DistributionSummary {
        count: outcomes.len(),
        mean,
        std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        downside_p10_gap: mean - percentiles.p10,
        percentiles,
        probability_positive: probability_positive(outcomes).unwrap_or(0.0),
        histogram: histogram(outcomes, HISTOGRAM_BINS),
        cdf: cdf_sample(outcomes, CDF_POINTS),
    })
}
