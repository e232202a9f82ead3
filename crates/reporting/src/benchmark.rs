//! Industry benchmark table and per-metric performance classification.

use crate::ratio::safe_div;
use serde::{Deserialize, Serialize};

/// Expected CTR (%), CVR (%), and CAC for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBenchmark {
    pub ctr: f64,
    pub cvr: f64,
    pub cac: f64,
}

const DEFAULT_BENCHMARK: ChannelBenchmark = ChannelBenchmark {
    ctr: 2.0,
    cvr: 3.0,
    cac: 50.0,
};

const BENCHMARKS: &[(&str, ChannelBenchmark)] = &[
    ("Google Ads", ChannelBenchmark { ctr: 3.17, cvr: 4.4, cac: 48.0 }),
    ("Facebook Ads", ChannelBenchmark { ctr: 0.9, cvr: 9.21, cac: 40.0 }),
    ("Instagram Ads", ChannelBenchmark { ctr: 0.58, cvr: 3.1, cac: 45.0 }),
    ("LinkedIn Ads", ChannelBenchmark { ctr: 0.65, cvr: 6.1, cac: 75.0 }),
    ("Twitter Ads", ChannelBenchmark { ctr: 0.86, cvr: 0.9, cac: 60.0 }),
    ("TikTok Ads", ChannelBenchmark { ctr: 0.84, cvr: 1.1, cac: 35.0 }),
    ("Bing Ads", ChannelBenchmark { ctr: 2.83, cvr: 2.94, cac: 45.0 }),
    ("Email", ChannelBenchmark { ctr: 2.6, cvr: 1.2, cac: 20.0 }),
];

/// Benchmark for an exact (case-sensitive) channel name, else the default row.
pub fn benchmark_for(channel: &str) -> ChannelBenchmark {
    BENCHMARKS
        .iter()
        .find(|(name, _)| *name == channel)
        .map(|(_, bench)| *bench)
        .unwrap_or(DEFAULT_BENCHMARK)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Above,
    Average,
    Below,
}

/// Whether a larger value of the metric is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Tolerance before a metric counts as underperforming.
const BELOW_TOLERANCE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub actual: f64,
    pub benchmark: f64,
    /// `(actual - benchmark) / benchmark * 100`.
    pub percent_diff: f64,
    pub performance: Performance,
}

impl MetricComparison {
    pub fn compare(actual: f64, benchmark: f64, direction: Direction) -> Self {
        let performance = match direction {
            Direction::HigherIsBetter => {
                if actual > benchmark {
                    Performance::Above
                } else if actual < benchmark * (1.0 - BELOW_TOLERANCE) {
                    Performance::Below
                } else {
                    Performance::Average
                }
            }
            Direction::LowerIsBetter => {
                if actual < benchmark {
                    Performance::Above
                } else if actual > benchmark * (1.0 + BELOW_TOLERANCE) {
                    Performance::Below
                } else {
                    Performance::Average
                }
            }
        };
        Self {
            actual,
            benchmark,
            percent_diff: safe_div(actual - benchmark, benchmark) * 100.0,
            performance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub ctr: MetricComparison,
    pub cvr: MetricComparison,
    pub cac: MetricComparison,
}

impl BenchmarkComparison {
    pub fn new(bench: &ChannelBenchmark, ctr: f64, cvr: f64, cac: f64) -> Self {
        Self {
            ctr: MetricComparison::compare(ctr, bench.ctr, Direction::HigherIsBetter),
            cvr: MetricComparison::compare(cvr, bench.cvr, Direction::HigherIsBetter),
            cac: MetricComparison::compare(cac, bench.cac, Direction::LowerIsBetter),
        }
    }
}
