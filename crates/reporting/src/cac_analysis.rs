//! CAC analysis: runs every methodology over one request and adds data
//! quality, recommendations, and metadata.

use crate::methodology::{
    channel_specific, cohort_based, contribution_margin, fully_loaded, simple_blended, CacInputs,
    ContributionMarginCac, FullyLoadedCac, SegmentCac, SegmentedCac, SimpleBlendedCac,
    UNKNOWN_COHORT,
};
use crate::opportunity::Priority;
use crate::ratio::safe_div;
use cac_core::normalize::{customer_records, marketing_rows, parse_date, revenue_rows};
use cac_core::{CostBreakdown, CustomerRecord, MarketingRow, RawRow, RevenueRow, UNKNOWN_CHANNEL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::info;

const METHODOLOGY_COUNT: usize = 5;
const OVERHEAD_RATIO_ALERT: f64 = 1.5;
const CHANNEL_SPREAD_ALERT: f64 = 2.0;
const COHORT_RISE_ALERT: f64 = 1.1;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessModel {
    Saas,
    Ecommerce,
    Marketplace,
    Subscription,
    #[default]
    #[serde(other)]
    Other,
}

impl BusinessModel {
    /// Minimum healthy LTV:CAC ratio for the model.
    pub fn target_ltv_cac_ratio(self) -> f64 {
        match self {
            Self::Ecommerce => 2.0,
            Self::Marketplace => 2.5,
            Self::Saas | Self::Subscription | Self::Other => 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub include_recommendations: bool,
    pub currency: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_recommendations: true,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacAnalysisRequest {
    #[serde(default)]
    pub business_model: BusinessModel,
    #[serde(default)]
    pub marketing_data: Vec<RawRow>,
    #[serde(default)]
    pub revenue_data: Vec<RawRow>,
    #[serde(default)]
    pub customer_data: Option<Vec<RawRow>>,
    #[serde(default)]
    pub additional_costs: Option<CostBreakdown>,
    #[serde(default)]
    pub analysis_config: Option<AnalysisConfig>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacCalculations {
    pub simple_blended: SimpleBlendedCac,
    pub fully_loaded: FullyLoadedCac,
    pub channel_specific: SegmentedCac,
    pub cohort_based: SegmentedCac,
    pub contribution_margin: ContributionMarginCac,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacDataQuality {
    pub score: u8,
    pub marketing_records: usize,
    pub revenue_records: usize,
    pub customer_records: usize,
    pub has_channel_data: bool,
    pub has_date_data: bool,
    pub has_customer_counts: bool,
    pub has_customer_data: bool,
    pub has_cost_breakdown: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    CostStructure,
    ChannelMix,
    Trend,
    UnitEconomics,
    DataCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacRecommendation {
    pub priority: Priority,
    pub category: RecommendationCategory,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub business_model: BusinessModel,
    pub analyzed_at: DateTime<Utc>,
    pub currency: String,
    pub marketing_records: usize,
    pub revenue_records: usize,
    pub customer_records: usize,
    pub methodologies: usize,
    pub engine_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacAnalysis {
    pub calculations: CacCalculations,
    pub data_quality: CacDataQuality,
    pub recommendations: Vec<CacRecommendation>,
    pub metadata: AnalysisMetadata,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn analyze_cac(request: &CacAnalysisRequest) -> CacAnalysis {
    let marketing = marketing_rows(&request.marketing_data);
    let revenue = revenue_rows(&request.revenue_data);
    let customers = request
        .customer_data
        .as_deref()
        .map(customer_records)
        .unwrap_or_default();
    let config = request.analysis_config.clone().unwrap_or_default();

    analyze_cac_rows(
        request.business_model,
        &marketing,
        &revenue,
        &customers,
        request.additional_costs.as_ref(),
        &config,
    )
}

pub fn analyze_cac_rows(
    business_model: BusinessModel,
    marketing: &[MarketingRow],
    revenue: &[RevenueRow],
    customers: &[CustomerRecord],
    costs: Option<&CostBreakdown>,
    config: &AnalysisConfig,
) -> CacAnalysis {
    let inputs = CacInputs {
        marketing,
        revenue,
        customers,
        costs,
    };

    let calculations = CacCalculations {
        simple_blended: simple_blended(&inputs),
        fully_loaded: fully_loaded(&inputs),
        channel_specific: channel_specific(&inputs),
        cohort_based: cohort_based(&inputs),
        contribution_margin: contribution_margin(&inputs),
    };
    let data_quality = assess_cac_data_quality(&inputs);
    let recommendations = if config.include_recommendations {
        recommend(business_model, &calculations, &data_quality, customers)
    } else {
        Vec::new()
    };

    info!(
        business_model = ?business_model,
        simple_cac = calculations.simple_blended.cac,
        fully_loaded_cac = calculations.fully_loaded.cac,
        data_quality = data_quality.score,
        recommendations = recommendations.len(),
        "CAC analysis complete"
    );

    CacAnalysis {
        metadata: AnalysisMetadata {
            business_model,
            analyzed_at: Utc::now(),
            currency: config.currency.clone(),
            marketing_records: marketing.len(),
            revenue_records: revenue.len(),
            customer_records: customers.len(),
            methodologies: METHODOLOGY_COUNT,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        calculations,
        data_quality,
        recommendations,
    }
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

pub fn assess_cac_data_quality(inputs: &CacInputs<'_>) -> CacDataQuality {
    let has_channel_data = inputs.marketing.iter().any(|r| r.channel != UNKNOWN_CHANNEL);
    let has_date_data = inputs
        .marketing
        .iter()
        .any(|r| r.date.as_deref().and_then(parse_date).is_some());
    let has_customer_counts = inputs.total_customers() > 0.0;
    let has_customer_data = !inputs.customers.is_empty();
    let has_cost_breakdown = inputs.costs.is_some_and(|c| c.total() > 0.0);

    let mut issues = Vec::new();
    let mut score: i32 = 100;
    if inputs.marketing.is_empty() {
        issues.push("No marketing spend records supplied".to_string());
        score = 0;
    }
    if !has_customer_counts {
        issues.push("Revenue data has no new-customer counts; CAC cannot be computed".to_string());
        score -= 25;
    }
    if !has_channel_data {
        issues.push("Marketing data has no channel column".to_string());
        score -= 20;
    }
    if !has_date_data {
        issues.push("Marketing data has no parseable dates; cohorts are unavailable".to_string());
        score -= 20;
    }
    if !has_cost_breakdown {
        issues.push("No team, tool, or overhead costs supplied".to_string());
        score -= 10;
    }
    if !has_customer_data {
        issues.push("No customer-level LTV data supplied".to_string());
        score -= 10;
    }

    CacDataQuality {
        score: score.clamp(0, 100) as u8,
        marketing_records: inputs.marketing.len(),
        revenue_records: inputs.revenue.len(),
        customer_records: inputs.customers.len(),
        has_channel_data,
        has_date_data,
        has_customer_counts,
        has_customer_data,
        has_cost_breakdown,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

fn recommendation(
    priority: Priority,
    category: RecommendationCategory,
    title: &str,
    message: String,
) -> CacRecommendation {
    CacRecommendation {
        priority,
        category,
        title: title.to_string(),
        message,
    }
}

/// Segments with a computable CAC, cheapest first.
fn priced_segments(segmented: &SegmentedCac) -> Vec<(&String, &SegmentCac)> {
    let mut priced: Vec<_> = segmented.segments.iter().filter(|(_, s)| s.cac > 0.0).collect();
    priced.sort_by(|a, b| a.1.cac.total_cmp(&b.1.cac));
    priced
}

pub fn recommend(
    business_model: BusinessModel,
    calculations: &CacCalculations,
    data_quality: &CacDataQuality,
    customers: &[CustomerRecord],
) -> Vec<CacRecommendation> {
    let mut out = Vec::new();
    let simple = calculations.simple_blended.cac;
    let loaded = calculations.fully_loaded.cac;

    if simple > 0.0 && loaded > simple * OVERHEAD_RATIO_ALERT {
        out.push(recommendation(
            Priority::High,
            RecommendationCategory::CostStructure,
            "Operating costs dominate acquisition cost",
            format!(
                "Team, tool, and overhead costs raise CAC from ${simple:.2} to ${loaded:.2} ({:.0}% higher). Review headcount and tooling spend per customer acquired.",
                safe_div(loaded - simple, simple) * 100.0
            ),
        ));
    }

    let priced = priced_segments(&calculations.channel_specific);
    if let (Some((cheap_name, cheap)), Some((dear_name, dear))) = (priced.first(), priced.last()) {
        if dear.cac > cheap.cac * CHANNEL_SPREAD_ALERT {
            out.push(recommendation(
                Priority::High,
                RecommendationCategory::ChannelMix,
                "Wide CAC spread between channels",
                format!(
                    "{dear_name} costs ${:.2} per customer versus ${:.2} on {cheap_name}. Shift incremental budget toward {cheap_name}.",
                    dear.cac, cheap.cac
                ),
            ));
        }
    }

    let months: Vec<_> = calculations
        .cohort_based
        .segments
        .iter()
        .filter(|(month, s)| month.as_str() != UNKNOWN_COHORT && s.cac > 0.0)
        .collect();
    if let [.., (prev_month, prev), (last_month, last)] = months.as_slice() {
        if last.cac > prev.cac * COHORT_RISE_ALERT {
            out.push(recommendation(
                Priority::Medium,
                RecommendationCategory::Trend,
                "CAC is rising month over month",
                format!(
                    "CAC rose from ${:.2} in {prev_month} to ${:.2} in {last_month}. Check for audience saturation and rising bid costs.",
                    prev.cac, last.cac
                ),
            ));
        }
    }

    let ltvs: Vec<f64> = customers.iter().map(|c| c.ltv).filter(|v| *v > 0.0).collect();
    if !ltvs.is_empty() && simple > 0.0 {
        let avg_ltv = ltvs.iter().sum::<f64>() / ltvs.len() as f64;
        let ratio = avg_ltv / simple;
        let target = business_model.target_ltv_cac_ratio();
        if ratio < target {
            out.push(recommendation(
                Priority::High,
                RecommendationCategory::UnitEconomics,
                "LTV:CAC below target",
                format!(
                    "LTV:CAC is {ratio:.1}:1 against a {target:.1}:1 target for this business model. Reduce CAC or raise retention before scaling spend."
                ),
            ));
        } else if ratio > target * 2.0 {
            out.push(recommendation(
                Priority::Low,
                RecommendationCategory::UnitEconomics,
                "Room to scale acquisition",
                format!(
                    "LTV:CAC is {ratio:.1}:1, well above the {target:.1}:1 target. Spend can likely grow before efficiency suffers."
                ),
            ));
        }
    }

    if !data_quality.has_customer_counts {
        out.push(recommendation(
            Priority::Medium,
            RecommendationCategory::DataCoverage,
            "Add new-customer counts",
            "Include a customers, new_customers, or acquisitions column in the revenue data so CAC can be computed.".to_string(),
        ));
    }
    if !data_quality.has_cost_breakdown {
        out.push(recommendation(
            Priority::Low,
            RecommendationCategory::DataCoverage,
            "Add operating costs",
            "Provide team, tool, and overhead costs to get a fully-loaded CAC.".to_string(),
        ));
    }
    if !data_quality.has_customer_data {
        out.push(recommendation(
            Priority::Low,
            RecommendationCategory::DataCoverage,
            "Add customer-level data",
            "Upload customer LTV data to compare CAC against lifetime value.".to_string(),
        ));
    }

    out.sort_by_key(|r| Reverse(r.priority.rank()));
    out
}
