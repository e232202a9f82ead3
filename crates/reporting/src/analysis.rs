//! Top-level channel and time-series analysis of one marketing/revenue
//! upload pair.

use crate::channel::{aggregate_channels, ChannelStats};
use crate::opportunity::{rank_opportunities, Opportunity};
use crate::ratio::{round2, safe_div};
use crate::timeseries::{aggregate_time_series, TimeAnalysis};
use cac_core::normalize::{marketing_rows, parse_date, revenue_rows};
use cac_core::{MarketingRow, RawRow, RevenueRow, UNKNOWN_CHANNEL};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Coverage of the inputs and what the defaulting policies absorbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub marketing_rows: usize,
    pub revenue_rows: usize,
    pub channels: usize,
    pub date_range: Option<DateRange>,
    pub rows_missing_date: usize,
    /// Marketing rows attributed to the `Unknown` channel, whether the
    /// channel column was absent or literally said "Unknown".
    pub rows_unknown_channel: usize,
    /// Revenue rows whose channel never appears in the marketing data.
    pub unmatched_revenue_rows: usize,
    pub unmatched_revenue: f64,
    pub completeness_score: u8,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(rename = "blendedCAC")]
    pub blended_cac: f64,
    pub total_spend: f64,
    pub total_customers: f64,
    pub total_revenue: f64,
    pub channel_performance: IndexMap<String, ChannelStats>,
    pub time_analysis: TimeAnalysis,
    pub opportunities: Vec<Opportunity>,
    pub data_quality: DataQuality,
}

/// Normalize raw rows and analyze them.
pub fn analyze_raw(marketing: &[RawRow], revenue: &[RawRow]) -> AnalysisReport {
    analyze(&marketing_rows(marketing), &revenue_rows(revenue))
}

pub fn analyze(marketing: &[MarketingRow], revenue: &[RevenueRow]) -> AnalysisReport {
    let total_spend: f64 = marketing.iter().map(|r| r.spend).sum();
    let total_revenue: f64 = revenue.iter().map(|r| r.revenue).sum();
    let marketing_customers: f64 = marketing.iter().map(|r| r.customers).sum();
    let total_customers = if marketing_customers > 0.0 {
        marketing_customers
    } else {
        revenue.iter().map(|r| r.customers).sum()
    };

    let channel_performance = aggregate_channels(marketing, revenue);
    let time_analysis = aggregate_time_series(marketing, revenue);
    let opportunities = rank_opportunities(&channel_performance);
    let data_quality = assess_data_quality(marketing, revenue, &channel_performance);

    if data_quality.unmatched_revenue_rows > 0 {
        warn!(
            rows = data_quality.unmatched_revenue_rows,
            revenue = data_quality.unmatched_revenue,
            "Dropped revenue for channels without marketing data"
        );
    }
    info!(
        marketing_rows = marketing.len(),
        revenue_rows = revenue.len(),
        channels = channel_performance.len(),
        opportunities = opportunities.len(),
        "Analysis complete"
    );

    AnalysisReport {
        blended_cac: round2(safe_div(total_spend, total_customers)),
        total_spend,
        total_customers,
        total_revenue,
        channel_performance,
        time_analysis,
        opportunities,
        data_quality,
    }
}

fn share(count: usize, total: usize) -> f64 {
    safe_div(count as f64, total as f64)
}

pub fn assess_data_quality(
    marketing: &[MarketingRow],
    revenue: &[RevenueRow],
    channels: &IndexMap<String, ChannelStats>,
) -> DataQuality {
    let rows_missing_date = marketing.iter().filter(|r| r.date.is_none()).count();
    let rows_unknown_channel = marketing
        .iter()
        .filter(|r| r.channel == UNKNOWN_CHANNEL)
        .count();
    let unmatched: Vec<&RevenueRow> = revenue
        .iter()
        .filter(|r| !channels.contains_key(&r.channel))
        .collect();
    let unmatched_revenue: f64 = unmatched.iter().map(|r| r.revenue).sum();

    let mut dates: Vec<_> = marketing
        .iter()
        .filter_map(|r| r.date.as_deref().and_then(parse_date))
        .collect();
    dates.sort_unstable();
    let date_range = match (dates.first(), dates.last()) {
        (Some(start), Some(end)) => Some(DateRange {
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
        }),
        _ => None,
    };

    let mut warnings = Vec::new();
    if marketing.is_empty() {
        warnings.push("No marketing rows supplied".to_string());
    }
    if revenue.is_empty() {
        warnings.push("No revenue rows supplied; ROAS is zero for every channel".to_string());
    }
    if rows_missing_date > 0 {
        warnings.push(format!(
            "{rows_missing_date} marketing rows have no date and are excluded from time analysis"
        ));
    }
    if rows_unknown_channel > 0 {
        warnings.push(format!(
            "{rows_unknown_channel} marketing rows are not attributed to a channel and were grouped as \"{UNKNOWN_CHANNEL}\""
        ));
    }
    if !unmatched.is_empty() {
        warnings.push(format!(
            "{} revenue rows (${:.2}) reference channels with no marketing data and were ignored",
            unmatched.len(),
            unmatched_revenue
        ));
    }

    let completeness_score = if marketing.is_empty() {
        0
    } else {
        let mut score = 100.0;
        score -= 30.0 * share(rows_missing_date, marketing.len());
        score -= 30.0 * share(rows_unknown_channel, marketing.len());
        score -= 20.0 * share(unmatched.len(), revenue.len());
        if revenue.is_empty() {
            score -= 20.0;
        }
        f64::clamp(score, 0.0, 100.0).round() as u8
    };

    DataQuality {
        marketing_rows: marketing.len(),
        revenue_rows: revenue.len(),
        channels: channels.len(),
        date_range,
        rows_missing_date,
        rows_unknown_channel,
        unmatched_revenue_rows: unmatched.len(),
        unmatched_revenue,
        completeness_score,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: Option<&str>, channel: &str, spend: f64, customers: f64) -> MarketingRow {
        MarketingRow {
            date: date.map(str::to_string),
            channel: channel.to_string(),
            spend,
            customers,
            ..Default::default()
        }
    }

    #[test]
    fn test_blended_cac_rounded() {
        let report = analyze(
            &[
                row(Some("2024-01-01"), "Email", 100.0, 3.0),
                row(Some("2024-01-02"), "Email", 0.0, 0.0),
            ],
            &[],
        );
        assert_eq!(report.blended_cac, 33.33);
        assert_eq!(report.total_customers, 3.0);
    }

    #[test]
    fn test_customers_fall_back_to_revenue_side() {
        let report = analyze(
            &[row(Some("2024-01-01"), "Email", 100.0, 0.0)],
            &[RevenueRow {
                channel: "Email".to_string(),
                customers: 4.0,
                revenue: 400.0,
                ..Default::default()
            }],
        );
        assert_eq!(report.total_customers, 4.0);
        assert_eq!(report.blended_cac, 25.0);
    }

    #[test]
    fn test_data_quality_counts() {
        let marketing = vec![
            row(Some("2024-03-05"), "Email", 10.0, 1.0),
            row(Some("2024-01-15"), "Unknown", 10.0, 1.0),
            row(None, "Email", 10.0, 1.0),
        ];
        let revenue = vec![
            RevenueRow {
                channel: "Email".to_string(),
                revenue: 50.0,
                ..Default::default()
            },
            RevenueRow {
                channel: "Podcast".to_string(),
                revenue: 75.0,
                ..Default::default()
            },
        ];
        let report = analyze(&marketing, &revenue);
        let dq = &report.data_quality;

        assert_eq!(dq.rows_missing_date, 1);
        assert_eq!(dq.rows_unknown_channel, 1);
        assert_eq!(dq.unmatched_revenue_rows, 1);
        assert!((dq.unmatched_revenue - 75.0).abs() < f64::EPSILON);
        assert_eq!(
            dq.date_range,
            Some(DateRange {
                start: "2024-01-15".into(),
                end: "2024-03-05".into()
            })
        );
        // 100 - 10 - 10 - 10
        assert_eq!(dq.completeness_score, 70);
        assert_eq!(dq.warnings.len(), 3);
    }

    #[test]
    fn test_unknown_channel_counts_absent_and_literal() {
        let raw: Vec<RawRow> = vec![
            serde_json::from_str(r#"{"date": "2024-01-01", "spend": 10}"#).unwrap(),
            serde_json::from_str(r#"{"date": "2024-01-01", "channel": "Unknown", "spend": 10}"#)
                .unwrap(),
            serde_json::from_str(r#"{"date": "2024-01-01", "channel": "Email", "spend": 10}"#)
                .unwrap(),
        ];
        let report = analyze_raw(&raw, &[]);
        assert_eq!(report.data_quality.rows_unknown_channel, 2);
        assert_eq!(report.channel_performance.len(), 2);
        assert!(report.data_quality.warnings[1].contains("not attributed to a channel"));

        let json = serde_json::to_value(&report.data_quality).unwrap();
        assert_eq!(json["rowsUnknownChannel"], 2);
    }

    #[test]
    fn test_empty_input() {
        let report = analyze(&[], &[]);
        assert_eq!(report.blended_cac, 0.0);
        assert!(report.channel_performance.is_empty());
        assert!(report.opportunities.is_empty());
        assert_eq!(report.data_quality.completeness_score, 0);
    }

    #[test]
    fn test_json_contract_keys() {
        let report = analyze(&[row(Some("2024-01-01"), "Email", 10.0, 1.0)], &[]);
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "blendedCAC",
            "totalSpend",
            "totalCustomers",
            "totalRevenue",
            "channelPerformance",
            "timeAnalysis",
            "opportunities",
            "dataQuality",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["timeAnalysis"]["trends"]["cac_trend"], "stable");
        assert_eq!(json["channelPerformance"]["Email"]["avgDailySpend"], 10.0);
    }
}
