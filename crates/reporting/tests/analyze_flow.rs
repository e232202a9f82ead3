//! End-to-end analysis over raw rows, as delivered by ingestion.

use cac_core::RawRow;
use cac_reporting::timeseries::Direction;
use cac_reporting::{analyze, analyze_raw, OpportunityType, Priority};
use serde_json::json;

fn rows(value: serde_json::Value) -> Vec<RawRow> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_google_ads_example() {
    let marketing = rows(json!([{
        "date": "2024-01-01", "channel": "Google Ads",
        "spend": 1000, "clicks": 500, "impressions": 10000, "customers": 20
    }]));
    let revenue = rows(json!([{ "date": "2024-01-01", "channel": "Google Ads", "revenue": 5000 }]));

    let report = analyze_raw(&marketing, &revenue);
    let g = &report.channel_performance["Google Ads"];
    assert!((g.cac - 50.0).abs() < 1e-9);
    assert!((g.ctr - 5.0).abs() < 1e-9);
    assert!((g.cvr - 4.0).abs() < 1e-9);
    assert!((g.cpc - 2.0).abs() < 1e-9);
    assert!((g.roas - 5.0).abs() < 1e-9);
    assert_eq!(report.blended_cac, 50.0);
    assert_eq!(report.time_analysis.daily["2024-01-01"].revenue, 5000.0);
}

#[test]
fn test_string_cells_and_fallback_columns() {
    let marketing = rows(json!([
        { "day": "2024-01-01", "source": "Email", "cost": "$1,200", "conversions": "12" },
        { "day": "2024-01-02", "source": "Email", "cost": "oops", "conversions": "" }
    ]));
    let report = analyze_raw(&marketing, &[]);
    let email = &report.channel_performance["Email"];
    assert_eq!(email.spend, 1200.0);
    assert_eq!(email.customers, 12.0);
    assert_eq!(email.days, 2);
}

#[test]
fn test_cac_trend_increasing_over_fourteen_days() {
    let marketing: Vec<RawRow> = (1..=14)
        .map(|d| {
            let spend = if d <= 7 { 500.0 } else { 600.0 };
            rows(json!([{
                "date": format!("2024-03-{d:02}"), "channel": "Google Ads",
                "spend": spend, "customers": 10
            }]))
            .remove(0)
        })
        .collect();
    let report = analyze_raw(&marketing, &[]);
    assert_eq!(report.time_analysis.trends.cac_trend, Direction::Increasing);
}

#[test]
fn test_strategic_reallocation_for_wide_gap() {
    let marketing = rows(json!([
        { "date": "2024-01-01", "channel": "Google Ads", "spend": 1000, "clicks": 500, "impressions": 10000, "customers": 20 },
        { "date": "2024-01-01", "channel": "Display", "spend": 500, "clicks": 5, "impressions": 5000, "customers": 0 },
        { "date": "2024-01-02", "channel": "Display", "spend": 500, "clicks": 5, "impressions": 5000, "customers": 0 }
    ]));
    let revenue = rows(json!([{ "channel": "Google Ads", "revenue": 5000 }]));
    let report = analyze_raw(&marketing, &revenue);

    let google = &report.channel_performance["Google Ads"];
    let display = &report.channel_performance["Display"];
    assert!(google.efficiency_score - display.efficiency_score > 30);

    let first = &report.opportunities[0];
    assert_eq!(first.kind, OpportunityType::StrategicReallocation);
    let mv = first.budget_move.as_ref().unwrap();
    assert_eq!(mv.from, "Display");
    assert_eq!(mv.to.as_deref(), Some("Google Ads"));
    assert_eq!(mv.amount, (display.avg_daily_spend * 0.25).round());
    assert_eq!(mv.amount, 125.0);

    let ranks: Vec<u8> = report.opportunities.iter().map(|o| o.priority.rank()).collect();
    assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
    assert!(report
        .opportunities
        .iter()
        .any(|o| o.kind == OpportunityType::BudgetReallocation && o.priority == Priority::High));
}

#[test]
fn test_orphan_revenue_is_dropped() {
    let marketing = rows(json!([{ "date": "2024-01-01", "channel": "Email", "spend": 100 }]));
    let revenue = rows(json!([
        { "date": "2024-01-01", "channel": "Email", "revenue": 40 },
        { "date": "2024-01-01", "channel": "Affiliates", "revenue": 900 }
    ]));
    let report = analyze_raw(&marketing, &revenue);
    assert!(!report.channel_performance.contains_key("Affiliates"));
    assert_eq!(report.channel_performance["Email"].revenue, 40.0);
    assert_eq!(report.data_quality.unmatched_revenue_rows, 1);
    // Top-line revenue still counts every revenue row.
    assert_eq!(report.total_revenue, 940.0);
}

#[test]
fn test_blended_cac_matches_independent_totals() {
    let marketing: Vec<RawRow> = (0..40)
        .map(|i| {
            let channel = ["Google Ads", "Facebook Ads", "Email"][i % 3];
            rows(json!([{
                "date": format!("2024-02-{:02}", i % 28 + 1),
                "channel": channel,
                "spend": 37.5 * (i as f64 + 1.0),
                "customers": (i % 7) as f64,
                "clicks": (i * 13 % 50) as f64,
                "impressions": (i * 101 % 997) as f64
            }]))
            .remove(0)
        })
        .collect();

    let report = analyze_raw(&marketing, &[]);
    let spend: f64 = (0..40).map(|i| 37.5 * (i as f64 + 1.0)).sum();
    let customers: f64 = (0..40).map(|i| (i % 7) as f64).sum();
    assert!((report.blended_cac - ((spend / customers) * 100.0).round() / 100.0).abs() < 1e-9);

    for stats in report.channel_performance.values() {
        for value in [stats.cac, stats.ctr, stats.cvr, stats.cpc, stats.roas] {
            assert!(value.is_finite() && value >= 0.0);
        }
        assert!(stats.efficiency_score <= 100);
    }

    let again = analyze_raw(&marketing, &[]);
    assert_eq!(
        serde_json::to_string(&report.opportunities).unwrap(),
        serde_json::to_string(&again.opportunities).unwrap()
    );
}

#[test]
fn test_typed_rows_match_raw_rows() {
    let marketing = rows(json!([{ "date": "2024-01-01", "channel": "Email", "spend": 90, "customers": 3 }]));
    let typed = cac_core::normalize::marketing_rows(&marketing);
    assert_eq!(analyze(&typed, &[]), analyze_raw(&marketing, &[]));
}
