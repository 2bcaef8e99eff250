//! Head and tail sampling decisions.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::SamplingConfig;
use crate::trace::Trace;

/// Why a finalized trace was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TailDecision {
    /// At least one span ended with an error.
    KeepError,
    /// Slower than `slow_trace_multiplier × sla_target_ms`.
    KeepSlow,
    /// Ordinary traffic that won the probabilistic draw.
    KeepSampled,
    Drop,
}

impl TailDecision {
    pub fn is_retained(self) -> bool {
        self != TailDecision::Drop
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TailDecision::KeepError => "keep_error",
            TailDecision::KeepSlow => "keep_slow",
            TailDecision::KeepSampled => "keep_sampled",
            TailDecision::Drop => "drop",
        }
    }
}

/// Sampling policy shared by every request thread.
///
/// The configuration is swapped atomically on reload; decisions in flight
/// finish against the snapshot they loaded.
#[derive(Debug)]
pub struct Sampler {
    config: ArcSwap<SamplingConfig>,
}

impl Sampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    pub fn config(&self) -> Arc<SamplingConfig> {
        self.config.load_full()
    }

    pub fn update(&self, config: SamplingConfig) {
        tracing::info!(
            sample_rate = config.sample_rate,
            sla_target_ms = config.sla_target_ms,
            "Sampling configuration updated"
        );
        self.config.store(Arc::new(config));
    }

    /// Decision made once at trace start and carried in the context.
    pub fn head_decision(&self) -> bool {
        fastrand::f64() < self.config.load().sample_rate
    }

    /// Decision made at trace end; governs local retention.
    pub fn tail_decision(&self, trace: &Trace) -> TailDecision {
        let config = self.config.load();
        if trace.error_count > 0 {
            TailDecision::KeepError
        } else if trace.total_duration_ms > config.slow_trace_multiplier * config.sla_target_ms {
            TailDecision::KeepSlow
        } else if fastrand::f64() < config.sample_rate {
            TailDecision::KeepSampled
        } else {
            TailDecision::Drop
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(SamplingConfig::default())
    }
}
