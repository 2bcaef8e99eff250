//! Bounded raw-value histogram and percentile engine.
//!
//! # Percentiles
//! Nearest-rank order statistics over the retained samples, linearly
//! interpolated between the two adjacent sorted values:
//! ```text
//! rank = p/100 × (n - 1)
//! value = sorted[floor(rank)] + (sorted[ceil(rank)] - sorted[floor(rank)]) × frac(rank)
//! ```
//! Exact over the retained window; no streaming digest. Older samples fall
//! out of the window as the buffer wraps.

use serde::{Deserialize, Serialize};

use crate::buffer::BoundedRing;

/// The standard percentile set reported for latency-like series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    #[serde(rename = "p99.9")]
    pub p99_9: f64,
}

impl Percentiles {
    /// All zero for an empty input.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_unstable_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: percentile(sorted, 50.0),
            p90: percentile(sorted, 90.0),
            p95: percentile(sorted, 95.0),
            p99: percentile(sorted, 99.0),
            p99_9: percentile(sorted, 99.9),
        }
    }
}

/// Interpolated percentile of an ascending slice. `0.0` when empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (rank.ceil() as usize).min(n - 1);
            let weight = rank - lower as f64;
            let value = sorted[lower] + (sorted[upper] - sorted[lower]) * weight;
            // Rounding must not push the result outside its bracketing samples
            value.clamp(sorted[lower], sorted[upper])
        }
    }
}

/// Summary statistics over the retained samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    /// Samples ever recorded, including ones that have been evicted.
    pub total_count: u64,
    /// Samples currently retained.
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Raw samples for one series, capped at a fixed capacity.
#[derive(Debug, Clone)]
pub struct Histogram {
    values: BoundedRing<f64>,
    total_count: u64,
}

impl Histogram {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: BoundedRing::new(capacity),
            total_count: 0,
        }
    }

    /// Record a sample. Non-finite values are ignored.
    pub fn record(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.values.push(value);
        self.total_count += 1;
        true
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_unstable_by(f64::total_cmp);
        sorted
    }

    pub fn percentiles(&self) -> Percentiles {
        Percentiles::from_sorted(&self.sorted())
    }

    pub fn stats(&self) -> HistogramStats {
        if self.values.is_empty() {
            return HistogramStats {
                total_count: self.total_count,
                ..HistogramStats::default()
            };
        }
        let (sum, min, max) = self.values.iter().fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), &v| (sum + v, min.min(v), max.max(v)),
        );
        let count = self.values.len();
        HistogramStats {
            total_count: self.total_count,
            count,
            sum,
            mean: sum / count as f64,
            min,
            max,
        }
    }
}
