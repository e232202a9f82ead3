//! Opportunity ranking: turns channel statistics into a prioritized list of
//! optimization actions with explicit impact estimates.

use crate::benchmark::Performance;
use crate::channel::ChannelStats;
use crate::ratio::{round2, safe_div};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    BudgetReallocation,
    CreativeOptimization,
    FunnelOptimization,
    ProfitabilityOptimization,
    StrategicReallocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

/// A daily budget shift between two channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetMove {
    pub from: String,
    /// `None` when no better channel exists to receive the budget.
    pub to: Option<String>,
    /// Whole currency units per day.
    pub amount: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers_lost_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers_gained_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_customers: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_cac: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMetrics {
    pub metric: String,
    pub value: f64,
    pub target: f64,
    pub percent_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetImpact {
    pub spend: f64,
    pub revenue: f64,
    pub net_return: f64,
    /// Additional revenue needed to reach the target ROAS.
    pub revenue_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    #[serde(rename = "type")]
    pub kind: OpportunityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub issue: String,
    pub recommendation: String,
    pub specific_actions: Vec<String>,
    pub impact: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_move: Option<BudgetMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_results: Option<ExpectedResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_metrics: Option<CurrentMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_impact: Option<BudgetImpact>,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

const LOW_EFFICIENCY_SCORE: u8 = 50;
const LOW_EFFICIENCY_CUT: f64 = 0.30;
const STRATEGIC_SCORE_GAP: u8 = 30;
const STRATEGIC_CUT: f64 = 0.25;
const CTR_HIGH_PRIORITY_GAP: f64 = 30.0;
const CVR_HIGH_PRIORITY_GAP: f64 = 25.0;
const TARGET_ROAS: f64 = 2.0;

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Highest-scoring channel; the earliest wins a tie.
fn best_channel(channels: &IndexMap<String, ChannelStats>) -> Option<&ChannelStats> {
    channels
        .values()
        .fold(None, |best: Option<&ChannelStats>, c| match best {
            Some(b) if b.efficiency_score >= c.efficiency_score => Some(b),
            _ => Some(c),
        })
}

/// Lowest-scoring channel; the earliest wins a tie.
fn worst_channel(channels: &IndexMap<String, ChannelStats>) -> Option<&ChannelStats> {
    channels
        .values()
        .fold(None, |worst: Option<&ChannelStats>, c| match worst {
            Some(w) if w.efficiency_score <= c.efficiency_score => Some(w),
            _ => Some(c),
        })
}

/// Customers per day lost and gained by moving `amount` from `from` to `to`.
fn reallocation_results(amount: f64, from: &ChannelStats, to: Option<&ChannelStats>) -> ExpectedResults {
    ExpectedResults {
        customers_lost_per_day: Some(round2(safe_div(amount, from.cac))),
        customers_gained_per_day: to.map(|t| round2(safe_div(amount, t.cac))),
        ..Default::default()
    }
}

fn budget_reallocation(stats: &ChannelStats, best: Option<&ChannelStats>) -> Opportunity {
    let target = best.filter(|b| b.channel != stats.channel);
    let amount = (stats.avg_daily_spend * LOW_EFFICIENCY_CUT).round();
    let expected = reallocation_results(amount, stats, target);

    let (recommendation, impact) = match target {
        Some(t) => (
            format!(
                "Reduce {} daily spend by 30% (${amount:.0}/day) and shift it to {}",
                stats.channel, t.channel
            ),
            format!(
                "Moving ${amount:.0}/day trades ~{:.1} customers/day on {} for ~{:.1} on {}",
                expected.customers_lost_per_day.unwrap_or(0.0),
                stats.channel,
                expected.customers_gained_per_day.unwrap_or(0.0),
                t.channel
            ),
        ),
        None => (
            format!(
                "Reduce {} daily spend by 30% (${amount:.0}/day) until efficiency improves",
                stats.channel
            ),
            format!("Frees ${amount:.0}/day of low-efficiency spend"),
        ),
    };

    let mut actions = vec![format!(
        "Pause the lowest-converting campaigns in {}",
        stats.channel
    )];
    if let Some(t) = target {
        actions.push(format!("Move ${amount:.0}/day to {}", t.channel));
    }
    actions.push("Tighten targeting and bids before restoring budget".to_string());
    actions.push("Re-evaluate channel efficiency after 14 days".to_string());

    Opportunity {
        kind: OpportunityType::BudgetReallocation,
        channel: Some(stats.channel.clone()),
        issue: format!(
            "{} efficiency score is {}/100 (grade {:?})",
            stats.channel, stats.efficiency_score, stats.grade
        ),
        recommendation,
        specific_actions: actions,
        impact,
        priority: Priority::High,
        budget_move: Some(BudgetMove {
            from: stats.channel.clone(),
            to: target.map(|t| t.channel.clone()),
            amount,
            percent: LOW_EFFICIENCY_CUT * 100.0,
        }),
        expected_results: Some(expected),
        current_metrics: None,
        budget_impact: None,
    }
}

fn creative_optimization(stats: &ChannelStats) -> Opportunity {
    let ctr = &stats.benchmark.ctr;
    let priority = if ctr.percent_diff.abs() > CTR_HIGH_PRIORITY_GAP {
        Priority::High
    } else {
        Priority::Medium
    };
    // Same clicks at benchmark CTR would need proportionally fewer impressions.
    let projected_cpc = safe_div(stats.spend, stats.impressions * ctr.benchmark / 100.0);

    Opportunity {
        kind: OpportunityType::CreativeOptimization,
        channel: Some(stats.channel.clone()),
        issue: format!(
            "CTR of {:.2}% is {:.0}% below the {:.2}% benchmark",
            ctr.actual,
            ctr.percent_diff.abs(),
            ctr.benchmark
        ),
        recommendation: format!("Refresh ad creative and messaging on {}", stats.channel),
        specific_actions: vec![
            "A/B test new headlines and calls to action".to_string(),
            "Rotate in fresh visuals for fatigued ads".to_string(),
            "Tighten audience targeting to improve relevance".to_string(),
            "Review ad placements with the lowest CTR".to_string(),
        ],
        impact: format!(
            "Reaching benchmark CTR could lower CPC from ${:.2} to ~${:.2}",
            stats.cpc, projected_cpc
        ),
        priority,
        budget_move: None,
        expected_results: None,
        current_metrics: Some(CurrentMetrics {
            metric: "ctr".to_string(),
            value: ctr.actual,
            target: ctr.benchmark,
            percent_diff: round2(ctr.percent_diff),
        }),
        budget_impact: None,
    }
}

fn funnel_optimization(stats: &ChannelStats) -> Opportunity {
    let cvr = &stats.benchmark.cvr;
    let priority = if cvr.percent_diff.abs() > CVR_HIGH_PRIORITY_GAP {
        Priority::High
    } else {
        Priority::Medium
    };
    let additional = (stats.clicks * (cvr.benchmark - cvr.actual) / 100.0).max(0.0);
    let projected_cac = safe_div(stats.spend, stats.customers + additional);

    Opportunity {
        kind: OpportunityType::FunnelOptimization,
        channel: Some(stats.channel.clone()),
        issue: format!(
            "Conversion rate of {:.2}% is {:.0}% below the {:.2}% benchmark",
            cvr.actual,
            cvr.percent_diff.abs(),
            cvr.benchmark
        ),
        recommendation: format!(
            "Optimize landing pages and checkout flow for {} traffic",
            stats.channel
        ),
        specific_actions: vec![
            "Align landing page copy with ad messaging".to_string(),
            "Reduce form fields and checkout steps".to_string(),
            "Add social proof and trust signals".to_string(),
            "Improve page load speed on mobile".to_string(),
        ],
        impact: format!(
            "Benchmark conversion would add ~{:.0} customers and bring CAC to ~${:.2}",
            additional, projected_cac
        ),
        priority,
        budget_move: None,
        expected_results: Some(ExpectedResults {
            additional_customers: Some(round2(additional)),
            projected_cac: Some(round2(projected_cac)),
            ..Default::default()
        }),
        current_metrics: Some(CurrentMetrics {
            metric: "cvr".to_string(),
            value: cvr.actual,
            target: cvr.benchmark,
            percent_diff: round2(cvr.percent_diff),
        }),
        budget_impact: None,
    }
}

fn profitability_optimization(stats: &ChannelStats) -> Opportunity {
    let revenue_gap = (stats.spend * TARGET_ROAS - stats.revenue).max(0.0);

    Opportunity {
        kind: OpportunityType::ProfitabilityOptimization,
        channel: Some(stats.channel.clone()),
        issue: format!(
            "ROAS of {:.2}x is below the {:.1}x target",
            stats.roas, TARGET_ROAS
        ),
        recommendation: format!(
            "Improve revenue per customer or cut unprofitable spend on {}",
            stats.channel
        ),
        specific_actions: vec![
            "Focus bids on high-value audiences and products".to_string(),
            "Introduce bundles or upsells to raise order value".to_string(),
            "Exclude segments with low purchase value".to_string(),
        ],
        impact: format!(
            "Needs ${revenue_gap:.0} more revenue at current spend to reach {TARGET_ROAS:.1}x ROAS"
        ),
        priority: Priority::Medium,
        budget_move: None,
        expected_results: None,
        current_metrics: Some(CurrentMetrics {
            metric: "roas".to_string(),
            value: stats.roas,
            target: TARGET_ROAS,
            percent_diff: round2(safe_div(stats.roas - TARGET_ROAS, TARGET_ROAS) * 100.0),
        }),
        budget_impact: Some(BudgetImpact {
            spend: stats.spend,
            revenue: stats.revenue,
            net_return: stats.revenue - stats.spend,
            revenue_gap,
        }),
    }
}

fn strategic_reallocation(best: &ChannelStats, worst: &ChannelStats) -> Opportunity {
    let amount = (worst.avg_daily_spend * STRATEGIC_CUT).round();

    Opportunity {
        kind: OpportunityType::StrategicReallocation,
        channel: None,
        issue: format!(
            "{} scores {} points above {} ({} vs {})",
            best.channel,
            best.efficiency_score - worst.efficiency_score,
            worst.channel,
            best.efficiency_score,
            worst.efficiency_score
        ),
        recommendation: format!(
            "Shift 25% of {} daily budget (${amount:.0}/day) to {}",
            worst.channel, best.channel
        ),
        specific_actions: vec![
            format!("Lower {} daily budget by ${amount:.0}", worst.channel),
            format!("Raise {} daily budget by ${amount:.0}", best.channel),
            format!("Watch {} CAC for diminishing returns as spend scales", best.channel),
        ],
        impact: format!(
            "Same total spend buys more customers at {}'s ${:.2} CAC vs ${:.2}",
            best.channel, best.cac, worst.cac
        ),
        priority: Priority::High,
        budget_move: Some(BudgetMove {
            from: worst.channel.clone(),
            to: Some(best.channel.clone()),
            amount,
            percent: STRATEGIC_CUT * 100.0,
        }),
        expected_results: Some(reallocation_results(amount, worst, Some(best))),
        current_metrics: None,
        budget_impact: None,
    }
}

/// Emit opportunities for every channel, prepend the cross-channel
/// reallocation when the score spread is wide, and order by priority.
/// The sort is stable, so equal priorities keep generation order.
pub fn rank_opportunities(channels: &IndexMap<String, ChannelStats>) -> Vec<Opportunity> {
    let best = best_channel(channels);
    let mut opportunities = Vec::new();

    if channels.len() >= 2 {
        if let (Some(b), Some(w)) = (best, worst_channel(channels)) {
            if b.efficiency_score - w.efficiency_score > STRATEGIC_SCORE_GAP {
                opportunities.push(strategic_reallocation(b, w));
            }
        }
    }

    for stats in channels.values() {
        if stats.efficiency_score < LOW_EFFICIENCY_SCORE {
            opportunities.push(budget_reallocation(stats, best));
        }
        if stats.benchmark.ctr.performance == Performance::Below {
            opportunities.push(creative_optimization(stats));
        }
        if stats.benchmark.cvr.performance == Performance::Below {
            opportunities.push(funnel_optimization(stats));
        }
        if stats.roas > 0.0 && stats.roas < TARGET_ROAS {
            opportunities.push(profitability_optimization(stats));
        }
    }

    opportunities.sort_by_key(|o| Reverse(o.priority.rank()));
    opportunities
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
