//! Channel aggregation: per-channel totals, derived ratios, benchmark
//! comparison, and the 0–100 efficiency score.

use crate::benchmark::{benchmark_for, BenchmarkComparison, ChannelBenchmark};
use crate::ratio::safe_div;
use cac_core::{MarketingRow, RevenueRow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::A,
            75..=84 => Self::B,
            65..=74 => Self::C,
            50..=64 => Self::D,
            _ => Self::F,
        }
    }
}

/// Aggregated performance of one channel across all rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel: String,
    pub spend: f64,
    pub customers: f64,
    pub clicks: f64,
    pub impressions: f64,
    pub revenue: f64,
    /// Distinct dates seen for this channel.
    pub days: usize,
    /// Distinct campaign names seen for this channel.
    pub campaigns: usize,
    pub cac: f64,
    pub ctr: f64,
    pub cvr: f64,
    pub cpc: f64,
    pub roas: f64,
    pub avg_daily_spend: f64,
    pub benchmark: BenchmarkComparison,
    pub efficiency_score: u8,
    pub grade: Grade,
}

#[derive(Debug, Default)]
struct ChannelAccumulator {
    spend: f64,
    customers: f64,
    clicks: f64,
    impressions: f64,
    revenue: f64,
    dates: HashSet<String>,
    campaigns: HashSet<String>,
}

impl ChannelAccumulator {
    fn add_marketing(&mut self, row: &MarketingRow) {
        self.spend += row.spend;
        self.customers += row.customers;
        self.clicks += row.clicks;
        self.impressions += row.impressions;
        if let Some(date) = &row.date {
            self.dates.insert(date.clone());
        }
        if let Some(campaign) = &row.campaign_name {
            self.campaigns.insert(campaign.clone());
        }
    }

    fn finish(self, channel: String) -> ChannelStats {
        let cac = safe_div(self.spend, self.customers);
        let ctr = safe_div(self.clicks, self.impressions) * 100.0;
        let cvr = safe_div(self.customers, self.clicks) * 100.0;
        let cpc = safe_div(self.spend, self.clicks);
        let roas = safe_div(self.revenue, self.spend);
        let days = self.dates.len();

        let bench = benchmark_for(&channel);
        let efficiency_score = efficiency_score(&bench, cac, ctr, cvr, roas);
        debug!(channel = %channel, cac, ctr, cvr, roas, efficiency_score, "Channel scored");

        ChannelStats {
            benchmark: BenchmarkComparison::new(&bench, ctr, cvr, cac),
            grade: Grade::from_score(efficiency_score),
            avg_daily_spend: safe_div(self.spend, days as f64),
            campaigns: self.campaigns.len(),
            days,
            spend: self.spend,
            customers: self.customers,
            clicks: self.clicks,
            impressions: self.impressions,
            revenue: self.revenue,
            cac,
            ctr,
            cvr,
            cpc,
            roas,
            efficiency_score,
            channel,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group rows by exact channel name, in first-seen order.
///
/// Revenue rows only count toward channels that already appear in the
/// marketing data; revenue for any other channel is dropped.
pub fn aggregate_channels(
    marketing: &[MarketingRow],
    revenue: &[RevenueRow],
) -> IndexMap<String, ChannelStats> {
    let mut accumulators: IndexMap<String, ChannelAccumulator> = IndexMap::new();

    for row in marketing {
        accumulators
            .entry(row.channel.clone())
            .or_default()
            .add_marketing(row);
    }

    for row in revenue {
        if let Some(acc) = accumulators.get_mut(&row.channel) {
            acc.revenue += row.revenue;
        }
    }

    accumulators
        .into_iter()
        .map(|(channel, acc)| (channel.clone(), acc.finish(channel)))
        .collect()
}

/// Composite 0–100 score. Each term is capped before the terms are summed;
/// the sum is then clamped and rounded.
pub fn efficiency_score(bench: &ChannelBenchmark, cac: f64, ctr: f64, cvr: f64, roas: f64) -> u8 {
    let cac_term = if cac > 0.0 {
        ((safe_div(bench.cac, cac) - 1.0) * 30.0).clamp(-30.0, 30.0)
    } else {
        0.0
    };
    let ctr_term = (safe_div(ctr, bench.ctr) * 12.5).min(25.0);
    let cvr_term = (safe_div(cvr, bench.cvr) * 12.5).min(25.0);
    let roas_term = if roas > 2.0 {
        ((roas - 2.0) * 10.0).min(20.0)
    } else if roas < 1.0 {
        -15.0
    } else {
        0.0
    };

    let score = 50.0 + cac_term + ctr_term + cvr_term + roas_term;
    score.clamp(0.0, 100.0).round() as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Performance;

    fn marketing(date: &str, channel: &str, campaign: &str, spend: f64, clicks: f64, impressions: f64, customers: f64) -> MarketingRow {
        MarketingRow {
            date: Some(date.to_string()),
            channel: channel.to_string(),
            campaign_name: Some(campaign.to_string()),
            spend,
            clicks,
            impressions,
            customers,
        }
    }

    fn revenue(channel: &str, amount: f64) -> RevenueRow {
        RevenueRow {
            date: Some("2024-01-01".to_string()),
            channel: channel.to_string(),
            revenue: amount,
            ..Default::default()
        }
    }

    #[test]
    fn test_google_ads_ratios() {
        let stats = aggregate_channels(
            &[marketing("2024-01-01", "Google Ads", "Brand", 1000.0, 500.0, 10_000.0, 20.0)],
            &[revenue("Google Ads", 5000.0)],
        );
        let g = &stats["Google Ads"];
        assert!((g.cac - 50.0).abs() < f64::EPSILON);
        assert!((g.ctr - 5.0).abs() < f64::EPSILON);
        assert!((g.cvr - 4.0).abs() < f64::EPSILON);
        assert!((g.cpc - 2.0).abs() < f64::EPSILON);
        assert!((g.roas - 5.0).abs() < f64::EPSILON);
        assert_eq!(g.days, 1);
        assert!((g.avg_daily_spend - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_days_and_campaigns_are_distinct_counts() {
        let rows = vec![
            marketing("2024-01-01", "Email", "Promo", 10.0, 1.0, 10.0, 1.0),
            marketing("2024-01-01", "Email", "Promo", 10.0, 1.0, 10.0, 1.0),
            marketing("2024-01-02", "Email", "Digest", 10.0, 1.0, 10.0, 1.0),
        ];
        let stats = aggregate_channels(&rows, &[]);
        assert_eq!(stats["Email"].days, 2);
        assert_eq!(stats["Email"].campaigns, 2);
        assert!((stats["Email"].avg_daily_spend - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_revenue_for_unknown_channel_is_dropped() {
        let stats = aggregate_channels(
            &[marketing("2024-01-01", "Email", "Promo", 100.0, 10.0, 100.0, 2.0)],
            &[revenue("Email", 300.0), revenue("Podcast", 9_999.0)],
        );
        assert_eq!(stats.len(), 1);
        assert!(!stats.contains_key("Podcast"));
        assert!((stats["Email"].revenue - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_channel_keys_are_case_sensitive_and_ordered() {
        let rows = vec![
            marketing("2024-01-01", "email", "a", 1.0, 0.0, 0.0, 0.0),
            marketing("2024-01-01", "Email", "a", 1.0, 0.0, 0.0, 0.0),
            marketing("2024-01-01", "email", "a", 1.0, 0.0, 0.0, 0.0),
        ];
        let stats = aggregate_channels(&rows, &[]);
        let keys: Vec<_> = stats.keys().cloned().collect();
        assert_eq!(keys, vec!["email".to_string(), "Email".to_string()]);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let stats = aggregate_channels(
            &[MarketingRow {
                channel: "Display".to_string(),
                spend: 250.0,
                ..Default::default()
            }],
            &[],
        );
        let d = &stats["Display"];
        for value in [d.cac, d.ctr, d.cvr, d.cpc, d.roas, d.avg_daily_spend] {
            assert!(value.is_finite());
            assert_eq!(value, 0.0);
        }
        assert_eq!(d.days, 0);
    }

    #[test]
    fn test_score_clamped_for_extreme_ratios() {
        let bench = benchmark_for("Google Ads");
        let high = efficiency_score(&bench, 0.0001, 1_000.0, 1_000.0, 1_000.0);
        assert_eq!(high, 100);

        let low = efficiency_score(&bench, 1e9, 0.0, 0.0, 0.0);
        assert!(low <= 100);
        // 50 - 30 (cac floor) - 15 (roas penalty)
        assert_eq!(low, 5);
    }

    #[test]
    fn test_caps_apply_per_term() {
        let bench = ChannelBenchmark { ctr: 2.0, cvr: 3.0, cac: 50.0 };
        // At parity: 50 + 0 + 12.5 + 12.5, roas 1.5 contributes nothing.
        assert_eq!(efficiency_score(&bench, 50.0, 2.0, 3.0, 1.5), 75);
        // Huge CTR caps at 25 and does not spill into the other terms.
        assert_eq!(efficiency_score(&bench, 50.0, 200.0, 3.0, 1.5), 88);
        // ROAS bonus capped at 20.
        assert_eq!(efficiency_score(&bench, 50.0, 2.0, 3.0, 50.0), 95);
    }

    #[test]
    fn test_grades() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(85), Grade::A);
        assert_eq!(Grade::from_score(84), Grade::B);
        assert_eq!(Grade::from_score(75), Grade::B);
        assert_eq!(Grade::from_score(65), Grade::C);
        assert_eq!(Grade::from_score(50), Grade::D);
        assert_eq!(Grade::from_score(49), Grade::F);
    }

    #[test]
    fn test_benchmark_attached() {
        let stats = aggregate_channels(
            &[marketing("2024-01-01", "Facebook Ads", "Retarget", 500.0, 20.0, 10_000.0, 1.0)],
            &[],
        );
        let fb = &stats["Facebook Ads"];
        // CTR 0.2% vs 0.9% benchmark.
        assert_eq!(fb.benchmark.ctr.performance, Performance::Below);
        assert_eq!(fb.benchmark.cac.performance, Performance::Below);
    }
}
