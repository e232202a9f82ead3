//! Time-series aggregation: daily, weekly, and monthly buckets plus trend
//! classification from windowed CAC comparisons.

use crate::ratio::{percent_change, safe_div};
use cac_core::normalize::parse_date;
use cac_core::{MarketingRow, RevenueRow};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucketStats {
    pub spend: f64,
    pub customers: f64,
    pub revenue: f64,
    pub cac: f64,
    /// Channels active in the bucket; tracked for daily buckets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<BTreeSet<String>>,
}

impl TimeBucketStats {
    fn add_marketing(&mut self, row: &MarketingRow) {
        self.spend += row.spend;
        self.customers += row.customers;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Stable,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTrend {
    #[default]
    Stable,
    Improving,
    Deteriorating,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trends {
    pub cac_trend: Direction,
    pub spend_trend: Direction,
    pub customer_trend: Direction,
    pub weekly_performance: PerformanceTrend,
    pub monthly_performance: PerformanceTrend,
}

/// Bucketed time series. Keys sort chronologically as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAnalysis {
    pub daily: BTreeMap<String, TimeBucketStats>,
    pub weekly: BTreeMap<String, TimeBucketStats>,
    pub monthly: BTreeMap<String, TimeBucketStats>,
    pub trends: Trends,
}

// ---------------------------------------------------------------------------
// Bucket keys
// ---------------------------------------------------------------------------

/// `YYYY-Www` where `ww = ceil((day_of_year_0 + 1) / 7)`. This is a plain
/// seven-day split from January 1st, not an ISO-8601 week.
pub fn week_key(date: NaiveDate) -> String {
    let week = (date.ordinal0() + 1).div_ceil(7);
    format!("{}-W{:02}", date.year(), week)
}

/// `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Bucket rows by day, week, and month and classify trends.
///
/// Rows without a date are skipped. Rows whose date cannot be parsed still
/// land in the daily map (keyed by the raw string) but not in weekly or
/// monthly buckets. Revenue is added only to buckets that marketing rows
/// already created, independently per granularity.
pub fn aggregate_time_series(marketing: &[MarketingRow], revenue: &[RevenueRow]) -> TimeAnalysis {
    let mut daily: BTreeMap<String, TimeBucketStats> = BTreeMap::new();
    let mut weekly: BTreeMap<String, TimeBucketStats> = BTreeMap::new();
    let mut monthly: BTreeMap<String, TimeBucketStats> = BTreeMap::new();

    for row in marketing {
        let Some(date) = row.date.as_deref() else {
            continue;
        };

        let day = daily.entry(date.to_string()).or_insert_with(|| TimeBucketStats {
            channels: Some(BTreeSet::new()),
            ..Default::default()
        });
        day.add_marketing(row);
        if let Some(channels) = day.channels.as_mut() {
            channels.insert(row.channel.clone());
        }

        if let Some(parsed) = parse_date(date) {
            weekly.entry(week_key(parsed)).or_default().add_marketing(row);
            monthly.entry(month_key(parsed)).or_default().add_marketing(row);
        }
    }

    for row in revenue {
        let Some(date) = row.date.as_deref() else {
            continue;
        };
        if let Some(day) = daily.get_mut(date) {
            day.revenue += row.revenue;
        }
        if let Some(parsed) = parse_date(date) {
            if let Some(week) = weekly.get_mut(&week_key(parsed)) {
                week.revenue += row.revenue;
            }
            if let Some(month) = monthly.get_mut(&month_key(parsed)) {
                month.revenue += row.revenue;
            }
        }
    }

    for bucket in daily
        .values_mut()
        .chain(weekly.values_mut())
        .chain(monthly.values_mut())
    {
        bucket.cac = safe_div(bucket.spend, bucket.customers);
    }

    let trends = classify_trends(&daily, &weekly, &monthly);
    TimeAnalysis {
        daily,
        weekly,
        monthly,
        trends,
    }
}

// ---------------------------------------------------------------------------
// Trend classification
// ---------------------------------------------------------------------------

const DAILY_WINDOW: usize = 7;
const DAILY_THRESHOLD_PCT: f64 = 10.0;
const PERIOD_WINDOW: usize = 2;
const PERIOD_THRESHOLD_PCT: f64 = 15.0;

#[derive(Debug, Default, Clone, Copy)]
struct WindowTotals {
    spend: f64,
    customers: f64,
}

impl WindowTotals {
    fn sum<'a>(buckets: impl Iterator<Item = &'a TimeBucketStats>) -> Self {
        buckets.fold(Self::default(), |acc, b| Self {
            spend: acc.spend + b.spend,
            customers: acc.customers + b.customers,
        })
    }
}

/// Totals of the last `window` buckets and the `window` before them, or
/// `None` with fewer than `2 * window` buckets.
fn split_windows(
    buckets: &BTreeMap<String, TimeBucketStats>,
    window: usize,
) -> Option<(WindowTotals, WindowTotals)> {
    if buckets.len() < window * 2 {
        return None;
    }
    let values: Vec<&TimeBucketStats> = buckets.values().collect();
    let recent_start = values.len() - window;
    let previous = WindowTotals::sum(values[recent_start - window..recent_start].iter().copied());
    let recent = WindowTotals::sum(values[recent_start..].iter().copied());
    Some((previous, recent))
}

/// Percent change in window CAC; `None` when either window has no customers.
fn cac_change(previous: WindowTotals, recent: WindowTotals) -> Option<f64> {
    if previous.customers == 0.0 || recent.customers == 0.0 {
        return None;
    }
    percent_change(
        previous.spend / previous.customers,
        recent.spend / recent.customers,
    )
}

fn direction(change: Option<f64>, threshold: f64) -> Direction {
    match change {
        Some(c) if c > threshold => Direction::Increasing,
        Some(c) if c < -threshold => Direction::Decreasing,
        _ => Direction::Stable,
    }
}

/// A rising CAC is a deteriorating period.
fn performance(change: Option<f64>, threshold: f64) -> PerformanceTrend {
    match direction(change, threshold) {
        Direction::Increasing => PerformanceTrend::Deteriorating,
        Direction::Decreasing => PerformanceTrend::Improving,
        Direction::Stable => PerformanceTrend::Stable,
    }
}

fn period_performance(buckets: &BTreeMap<String, TimeBucketStats>) -> PerformanceTrend {
    let change = split_windows(buckets, PERIOD_WINDOW).and_then(|(prev, recent)| cac_change(prev, recent));
    performance(change, PERIOD_THRESHOLD_PCT)
}

pub fn classify_trends(
    daily: &BTreeMap<String, TimeBucketStats>,
    weekly: &BTreeMap<String, TimeBucketStats>,
    monthly: &BTreeMap<String, TimeBucketStats>,
) -> Trends {
    let mut trends = Trends::default();

    if let Some((previous, recent)) = split_windows(daily, DAILY_WINDOW) {
        trends.cac_trend = direction(cac_change(previous, recent), DAILY_THRESHOLD_PCT);
        trends.spend_trend = direction(
            percent_change(previous.spend, recent.spend),
            DAILY_THRESHOLD_PCT,
        );
        trends.customer_trend = direction(
            percent_change(previous.customers, recent.customers),
            DAILY_THRESHOLD_PCT,
        );
    }

    trends.weekly_performance = period_performance(weekly);
    trends.monthly_performance = period_performance(monthly);
    trends
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
