//! Row normalizer: maps heterogeneous tabular rows onto the canonical
//! marketing, revenue, and customer row types.
//!
//! Each canonical field is resolved through an ordered list of candidate
//! column names. The first candidate that is present and non-blank wins,
//! even when its value fails to parse. Numeric fields fall back to `0.0`
//! and the channel falls back to [`UNKNOWN_CHANNEL`]; no row is ever
//! rejected.

use crate::types::{
    CustomerRecord, FieldValue, MarketingRow, RawRow, RevenueRow, UNKNOWN_CHANNEL,
};
use chrono::{DateTime, NaiveDate};
use tracing::debug;

/// Canonical fields the engine reads from raw rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Spend,
    Clicks,
    Impressions,
    Customers,
    Revenue,
    Ltv,
    Channel,
    Campaign,
    Date,
    CustomerId,
}

impl CanonicalField {
    /// Column names consulted for this field, highest priority first.
    pub const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Spend => &["spend", "cost", "ad_spend", "amount_spent"],
            Self::Clicks => &["clicks", "link_clicks"],
            Self::Impressions => &["impressions", "views"],
            Self::Customers => &["customers", "conversions", "new_customers", "acquisitions"],
            Self::Revenue => &["revenue", "sales", "amount"],
            Self::Ltv => &["ltv", "lifetime_value", "customer_ltv"],
            Self::Channel => &["channel", "source"],
            Self::Campaign => &["campaign_name", "campaignName", "campaign"],
            Self::Date => &["date", "day", "acquisition_date"],
            Self::CustomerId => &["customer_id", "customerId", "id"],
        }
    }
}

/// First present, non-blank candidate value for `field`.
pub fn lookup(row: &RawRow, field: CanonicalField) -> Option<&FieldValue> {
    field
        .candidates()
        .iter()
        .filter_map(|name| row.get(*name))
        .find(|value| !value.is_blank())
}

/// Numeric value of a present cell, zeroed when it does not parse.
fn number_or_zero(field: CanonicalField, value: &FieldValue) -> f64 {
    parse_number(value).unwrap_or_else(|| {
        debug!(field = ?field, value = ?value, "Unparseable numeric cell treated as 0");
        0.0
    })
}

/// Numeric value of `field`, or `0.0` when absent or unparseable.
pub fn number(row: &RawRow, field: CanonicalField) -> f64 {
    optional_number(row, field).unwrap_or(0.0)
}

/// Numeric value of `field`, or `None` when absent. Present but unparseable
/// values still yield `Some(0.0)`.
pub fn optional_number(row: &RawRow, field: CanonicalField) -> Option<f64> {
    lookup(row, field).map(|value| number_or_zero(field, value))
}

/// Text value of `field`, trimmed.
pub fn text(row: &RawRow, field: CanonicalField) -> Option<String> {
    match lookup(row, field)? {
        FieldValue::Text(s) => Some(s.trim().to_string()),
        FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
            Some(format!("{}", *n as i64))
        }
        FieldValue::Number(n) => Some(n.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
        FieldValue::Null => None,
    }
}

/// Parse a cell as a non-negative finite number. Currency symbols and
/// thousands separators are stripped first.
pub fn parse_number(value: &FieldValue) -> Option<f64> {
    let parsed = match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != ',' && *c != '$')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        FieldValue::Bool(_) | FieldValue::Null => return None,
    };
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

/// Parse a date string in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

fn channel(row: &RawRow) -> String {
    text(row, CanonicalField::Channel).unwrap_or_else(|| UNKNOWN_CHANNEL.to_string())
}

impl MarketingRow {
    pub fn from_raw(row: &RawRow) -> Self {
        Self {
            date: text(row, CanonicalField::Date),
            channel: channel(row),
            campaign_name: text(row, CanonicalField::Campaign),
            spend: number(row, CanonicalField::Spend),
            clicks: number(row, CanonicalField::Clicks),
            impressions: number(row, CanonicalField::Impressions),
            customers: number(row, CanonicalField::Customers),
        }
    }
}

impl RevenueRow {
    pub fn from_raw(row: &RawRow) -> Self {
        Self {
            date: text(row, CanonicalField::Date),
            channel: channel(row),
            revenue: number(row, CanonicalField::Revenue),
            customers: number(row, CanonicalField::Customers),
            ltv: optional_number(row, CanonicalField::Ltv),
        }
    }
}

impl CustomerRecord {
    pub fn from_raw(row: &RawRow) -> Self {
        Self {
            customer_id: text(row, CanonicalField::CustomerId),
            date: text(row, CanonicalField::Date),
            channel: channel(row),
            ltv: number(row, CanonicalField::Ltv),
            revenue: number(row, CanonicalField::Revenue),
        }
    }
}

pub fn marketing_rows(rows: &[RawRow]) -> Vec<MarketingRow> {
    rows.iter().map(MarketingRow::from_raw).collect()
}

pub fn revenue_rows(rows: &[RawRow]) -> Vec<RevenueRow> {
    rows.iter().map(RevenueRow::from_raw).collect()
}

pub fn customer_records(rows: &[RawRow]) -> Vec<CustomerRecord> {
    rows.iter().map(CustomerRecord::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, FieldValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_customers_fall_through_candidates() {
        let r = row(&[("acquisitions", 7.0.into())]);
        assert!((number(&r, CanonicalField::Customers) - 7.0).abs() < f64::EPSILON);

        let r = row(&[("conversions", 3.0.into()), ("new_customers", 9.0.into())]);
        assert!((number(&r, CanonicalField::Customers) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blank_candidate_is_skipped() {
        let r = row(&[("customers", "  ".into()), ("conversions", "12".into())]);
        assert!((number(&r, CanonicalField::Customers) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unparseable_value_yields_zero_without_fallthrough() {
        let r = row(&[("customers", "n/a".into()), ("conversions", 5.0.into())]);
        assert_eq!(number(&r, CanonicalField::Customers), 0.0);
    }

    #[test]
    fn test_present_bad_value_is_zero_absent_is_none() {
        let r = row(&[("ltv", (-120.0).into()), ("spend", FieldValue::Bool(true))]);
        assert_eq!(optional_number(&r, CanonicalField::Ltv), Some(0.0));
        assert_eq!(number(&r, CanonicalField::Spend), 0.0);
        assert_eq!(optional_number(&r, CanonicalField::Revenue), None);
    }

    #[test]
    fn test_currency_and_thousands_separators() {
        assert_eq!(parse_number(&"$1,250.50".into()), Some(1250.5));
        assert_eq!(parse_number(&"-4".into()), None);
        assert_eq!(parse_number(&FieldValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_channel_from_source_and_default() {
        let r = row(&[("source", "Newsletter".into())]);
        assert_eq!(MarketingRow::from_raw(&r).channel, "Newsletter");

        let r = row(&[("spend", 10.0.into())]);
        let m = MarketingRow::from_raw(&r);
        assert_eq!(m.channel, UNKNOWN_CHANNEL);
        assert!(m.date.is_none());
        assert_eq!(m.clicks, 0.0);
    }

    #[test]
    fn test_revenue_row_ltv_optional() {
        let r = row(&[("revenue", "900".into()), ("new_customers", 3.0.into())]);
        let rev = RevenueRow::from_raw(&r);
        assert_eq!(rev.revenue, 900.0);
        assert_eq!(rev.customers, 3.0);
        assert!(rev.ltv.is_none());
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date("2024-03-09"), expected);
        assert_eq!(parse_date("2024/03/09"), expected);
        assert_eq!(parse_date("03/09/2024"), expected);
        assert_eq!(parse_date("2024-03-09T10:00:00Z"), expected);
        assert_eq!(parse_date("last tuesday"), None);
    }
}
