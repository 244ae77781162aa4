use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use feed_logging::feed_warn;
use scrollfeed_core::LoadKind;
use serde::{Deserialize, Serialize};

/// Samples kept for inspection.
const HISTORY_LIMIT: usize = 50;

/// Advisory limits; crossing them only produces warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceThresholds {
    pub max_initial_load_ms: u64,
    pub max_subsequent_load_ms: u64,
    pub max_items_in_memory: usize,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            max_initial_load_ms: 2000,
            max_subsequent_load_ms: 1000,
            max_items_in_memory: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSample {
    pub kind: LoadKind,
    pub page: u32,
    pub latency: Duration,
    pub cache_hit: bool,
    pub items_loaded: usize,
    pub items_in_memory: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceWarning {
    SlowInitialLoad { latency: Duration, limit: Duration },
    SlowSubsequentLoad { latency: Duration, limit: Duration },
    TooManyItems { count: usize, limit: usize },
}

impl fmt::Display for PerformanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceWarning::SlowInitialLoad { latency, limit } => write!(
                f,
                "initial load took {}ms (limit {}ms)",
                latency.as_millis(),
                limit.as_millis()
            ),
            PerformanceWarning::SlowSubsequentLoad { latency, limit } => write!(
                f,
                "page load took {}ms (limit {}ms)",
                latency.as_millis(),
                limit.as_millis()
            ),
            PerformanceWarning::TooManyItems { count, limit } => {
                write!(f, "{count} items in memory (limit {limit})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceSummary {
    pub loads: u64,
    pub average_latency: Duration,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub warnings: u64,
}

impl PerformanceSummary {
    /// Cache hit rate in percent; 0 before the first load.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64 * 100.0
        }
    }
}

/// Diagnostics-only record of page loads.
#[derive(Debug, Clone, Default)]
pub struct PerformanceRecorder {
    thresholds: PerformanceThresholds,
    history: VecDeque<LoadSample>,
    summary: PerformanceSummary,
    total_latency: Duration,
}

impl PerformanceRecorder {
    pub fn new(thresholds: PerformanceThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    pub fn thresholds(&self) -> PerformanceThresholds {
        self.thresholds
    }

    pub fn record(&mut self, sample: LoadSample) -> Vec<PerformanceWarning> {
        self.summary.loads += 1;
        self.total_latency += sample.latency;
        self.summary.average_latency = average(self.total_latency, self.summary.loads);
        if sample.cache_hit {
            self.summary.cache_hits += 1;
        } else {
            self.summary.cache_misses += 1;
        }

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(sample);

        let warnings = self.check(&sample);
        for warning in &warnings {
            feed_warn!("performance: {} (page {})", warning, sample.page);
        }
        self.summary.warnings += warnings.len() as u64;
        warnings
    }

    fn check(&self, sample: &LoadSample) -> Vec<PerformanceWarning> {
        let mut warnings = Vec::new();
        let limit = match sample.kind {
            LoadKind::Initial => Duration::from_millis(self.thresholds.max_initial_load_ms),
            LoadKind::More => Duration::from_millis(self.thresholds.max_subsequent_load_ms),
        };
        if sample.latency > limit {
            warnings.push(match sample.kind {
                LoadKind::Initial => PerformanceWarning::SlowInitialLoad {
                    latency: sample.latency,
                    limit,
                },
                LoadKind::More => PerformanceWarning::SlowSubsequentLoad {
                    latency: sample.latency,
                    limit,
                },
            });
        }
        if sample.items_in_memory > self.thresholds.max_items_in_memory {
            warnings.push(PerformanceWarning::TooManyItems {
                count: sample.items_in_memory,
                limit: self.thresholds.max_items_in_memory,
            });
        }
        warnings
    }

    pub fn history(&self) -> impl Iterator<Item = &LoadSample> {
        self.history.iter()
    }

    pub fn summary(&self) -> PerformanceSummary {
        self.summary
    }
}

fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
