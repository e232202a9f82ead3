//! Shared data model, row normalization, errors, and configuration for the
//! CAC analyzer.

pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::AppConfig;
pub use error::{CacError, CacResult};
pub use types::{
    CostBreakdown, CustomerRecord, FieldValue, MarketingRow, ParsedTable, RawRow, RevenueRow,
    UNKNOWN_CHANNEL,
};
