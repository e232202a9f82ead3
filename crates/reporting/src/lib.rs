//! CAC metrics engine: channel aggregation, time-series trends,
//! multi-methodology CAC, and optimization opportunity ranking.
//!
//! Every entry point is a pure function of its inputs: no I/O and no state
//! shared between calls.

pub mod analysis;
pub mod benchmark;
pub mod cac_analysis;
pub mod channel;
pub mod methodology;
pub mod opportunity;
pub mod ratio;
pub mod timeseries;

pub use analysis::{analyze, analyze_raw, AnalysisReport, DataQuality};
pub use cac_analysis::{analyze_cac, AnalysisConfig, BusinessModel, CacAnalysis, CacAnalysisRequest};
pub use channel::{aggregate_channels, ChannelStats, Grade};
pub use opportunity::{rank_opportunities, Opportunity, OpportunityType, Priority};
pub use timeseries::{aggregate_time_series, TimeAnalysis, Trends};
