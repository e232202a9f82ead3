//! Multi-methodology CAC: five independent ways of pricing a customer from
//! the same normalized inputs, each with a confidence rating and the
//! user-facing explanation of what it measures.

use crate::ratio::safe_div;
use cac_core::normalize::parse_date;
use cac_core::{CostBreakdown, CustomerRecord, MarketingRow, RevenueRow, UNKNOWN_CHANNEL};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Margin applied when no customer-level data refines it.
pub const DEFAULT_CONTRIBUTION_MARGIN: f64 = 0.5;

/// Cohort key for rows whose date is missing or unparseable.
pub const UNKNOWN_COHORT: &str = "Unknown";

const MIN_CONFIDENCE: u8 = 1;
const MAX_CONFIDENCE: u8 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Normalized inputs shared by all methodologies.
#[derive(Debug, Clone, Copy)]
pub struct CacInputs<'a> {
    pub marketing: &'a [MarketingRow],
    pub revenue: &'a [RevenueRow],
    pub customers: &'a [CustomerRecord],
    pub costs: Option<&'a CostBreakdown>,
}

impl CacInputs<'_> {
    pub fn total_spend(&self) -> f64 {
        self.marketing.iter().map(|r| r.spend).sum()
    }

    /// New customers as reported on the revenue side.
    pub fn total_customers(&self) -> f64 {
        self.revenue.iter().map(|r| r.customers).sum()
    }

    fn has_volume(&self) -> bool {
        self.total_spend() > 0.0 && self.total_customers() > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodologyNotes {
    pub explanation: String,
    pub use_case: String,
    pub limitations: String,
}

impl MethodologyNotes {
    fn new(explanation: &str, use_case: &str, limitations: &str) -> Self {
        Self {
            explanation: explanation.to_string(),
            use_case: use_case.to_string(),
            limitations: limitations.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleBlendedCac {
    pub cac: f64,
    pub total_spend: f64,
    pub total_customers: f64,
    pub confidence: u8,
    #[serde(flatten)]
    pub notes: MethodologyNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedCostBreakdown {
    pub marketing: f64,
    pub team: f64,
    pub tools: f64,
    pub overhead: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullyLoadedCac {
    pub cac: f64,
    pub total_cost: f64,
    pub total_customers: f64,
    pub cost_breakdown: LoadedCostBreakdown,
    pub confidence: u8,
    #[serde(flatten)]
    pub notes: MethodologyNotes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCac {
    pub spend: f64,
    pub customers: f64,
    pub cac: f64,
}

/// CAC broken out by channel or by acquisition month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedCac {
    pub segments: IndexMap<String, SegmentCac>,
    pub confidence: u8,
    #[serde(flatten)]
    pub notes: MethodologyNotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionMarginCac {
    pub cac: f64,
    pub contribution_margin: f64,
    pub total_spend: f64,
    pub total_customers: f64,
    pub confidence: u8,
    #[serde(flatten)]
    pub notes: MethodologyNotes,
}

fn confidence(points: u8) -> u8 {
    points.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

// ---------------------------------------------------------------------------
// 1. Simple blended
// ---------------------------------------------------------------------------

pub fn simple_blended(inputs: &CacInputs<'_>) -> SimpleBlendedCac {
    let total_spend = inputs.total_spend();
    let total_customers = inputs.total_customers();

    let mut points = 1;
    if inputs.has_volume() {
        points += 2;
    }
    if inputs.marketing.len() >= 30 {
        points += 1;
    }
    if inputs.revenue.len() >= 30 {
        points += 1;
    }

    SimpleBlendedCac {
        cac: safe_div(total_spend, total_customers),
        total_spend,
        total_customers,
        confidence: confidence(points),
        notes: MethodologyNotes::new(
            "Total marketing spend divided by total new customers.",
            "Quick health checks and board-level reporting.",
            "Ignores non-media acquisition costs and hides differences between channels.",
        ),
    }
}

// ---------------------------------------------------------------------------
// 2. Fully loaded
// ---------------------------------------------------------------------------

pub fn fully_loaded(inputs: &CacInputs<'_>) -> FullyLoadedCac {
    let costs = inputs.costs.copied().unwrap_or_default();
    let marketing = inputs.total_spend();
    let total_cost = marketing + costs.total();
    let total_customers = inputs.total_customers();

    let mut points = 1;
    if inputs.has_volume() {
        points += 2;
    }
    if costs.total() > 0.0 {
        points += 2;
    }

    FullyLoadedCac {
        cac: safe_div(total_cost, total_customers),
        total_cost,
        total_customers,
        cost_breakdown: LoadedCostBreakdown {
            marketing,
            team: costs.team_costs,
            tools: costs.tool_costs,
            overhead: costs.overhead_costs,
        },
        confidence: confidence(points),
        notes: MethodologyNotes::new(
            "Marketing spend plus team, tool, and overhead costs divided by new customers.",
            "Unit economics, fundraising, and true cost-of-growth analysis.",
            "Depends on how shared costs are allocated; overhead estimates can be subjective.",
        ),
    }
}

// ---------------------------------------------------------------------------
// 3. Channel-specific and 4. cohort-based
// ---------------------------------------------------------------------------

/// Spend from marketing rows and customers from revenue rows, keyed by
/// `key`, marketing keys first.
fn segment<'a>(
    inputs: &CacInputs<'a>,
    marketing_key: impl Fn(&'a MarketingRow) -> String,
    revenue_key: impl Fn(&'a RevenueRow) -> String,
) -> IndexMap<String, SegmentCac> {
    let mut segments: IndexMap<String, SegmentCac> = IndexMap::new();
    for row in inputs.marketing {
        segments.entry(marketing_key(row)).or_default().spend += row.spend;
    }
    for row in inputs.revenue {
        segments.entry(revenue_key(row)).or_default().customers += row.customers;
    }
    for seg in segments.values_mut() {
        seg.cac = safe_div(seg.spend, seg.customers);
    }
    segments
}

pub fn channel_specific(inputs: &CacInputs<'_>) -> SegmentedCac {
    let segments = segment(inputs, |r| r.channel.clone(), |r| r.channel.clone());

    let mut points = 1;
    if segments.len() >= 2 {
        points += 1;
    }
    if !segments.is_empty() && !segments.contains_key(UNKNOWN_CHANNEL) {
        points += 1;
    }
    if segments.values().all(|s| s.spend == 0.0 || s.customers > 0.0) {
        points += 1;
    }
    if inputs.has_volume() {
        points += 1;
    }

    SegmentedCac {
        segments,
        confidence: confidence(points),
        notes: MethodologyNotes::new(
            "Spend in each channel divided by the customers attributed to that channel.",
            "Deciding how to split budget between channels.",
            "Only as good as channel attribution; ignores cross-channel assists.",
        ),
    }
}

fn cohort_key(date: Option<&str>) -> String {
    date.and_then(parse_date)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| UNKNOWN_COHORT.to_string())
}

pub fn cohort_based(inputs: &CacInputs<'_>) -> SegmentedCac {
    let mut segments = segment(
        inputs,
        |r| cohort_key(r.date.as_deref()),
        |r| cohort_key(r.date.as_deref()),
    );
    segments.sort_keys();

    let known_months = segments.keys().filter(|k| *k != UNKNOWN_COHORT).count();
    let mut points = 1;
    if inputs.has_volume() {
        points += 1;
    }
    if known_months >= 3 {
        points += 2;
    } else if known_months >= 2 {
        points += 1;
    }
    if !segments.contains_key(UNKNOWN_COHORT) {
        points += 1;
    }

    SegmentedCac {
        segments,
        confidence: confidence(points),
        notes: MethodologyNotes::new(
            "Spend and new customers grouped by acquisition month.",
            "Tracking how acquisition efficiency changes over time.",
            "Needs several months of data; delayed conversions distort the latest cohorts.",
        ),
    }
}

// ---------------------------------------------------------------------------
// 5. Contribution margin
// ---------------------------------------------------------------------------

/// Average contribution margin across customer records. Every record
/// carries the fixed 0.5 margin, so the result is 0.5 with or without
/// customer data.
pub fn average_contribution_margin(customers: &[CustomerRecord]) -> f64 {
    if customers.is_empty() {
        return DEFAULT_CONTRIBUTION_MARGIN;
    }
    let margins: Vec<f64> = customers
        .iter()
        .map(|_| DEFAULT_CONTRIBUTION_MARGIN)
        .collect();
    safe_div(margins.iter().sum(), margins.len() as f64)
}

pub fn contribution_margin(inputs: &CacInputs<'_>) -> ContributionMarginCac {
    let total_spend = inputs.total_spend();
    let total_customers = inputs.total_customers();
    let margin = average_contribution_margin(inputs.customers);

    let mut points = 1;
    if inputs.has_volume() {
        points += 1;
    }
    if !inputs.customers.is_empty() {
        points += 2;
    }
    if inputs.customers.iter().any(|c| c.ltv > 0.0) {
        points += 1;
    }

    ContributionMarginCac {
        cac: safe_div(total_spend, total_customers * margin),
        contribution_margin: margin,
        total_spend,
        total_customers,
        confidence: confidence(points),
        notes: MethodologyNotes::new(
            "Marketing spend divided by customers weighted by their contribution margin.",
            "Profitability-focused budgeting and payback analysis.",
            "Margin assumptions drive the result; without customer margin data a 50% margin is assumed.",
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
