use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Channel name used when a row carries neither `channel` nor `source`.
pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// A single cell of an ingested row. CSV cells that look numeric arrive as
/// `Number`, everything else as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Absent for lookup purposes: null or blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A tabular row as produced by ingestion: arbitrary column names mapped to
/// loosely typed values.
pub type RawRow = IndexMap<String, FieldValue>;

/// Marketing spend row in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingRow {
    pub date: Option<String>,
    pub channel: String,
    pub campaign_name: Option<String>,
    pub spend: f64,
    pub clicks: f64,
    pub impressions: f64,
    pub customers: f64,
}

/// Revenue row in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRow {
    pub date: Option<String>,
    pub channel: String,
    pub revenue: f64,
    pub customers: f64,
    pub ltv: Option<f64>,
}

/// Customer-level record used by the contribution-margin methodology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id: Option<String>,
    pub date: Option<String>,
    pub channel: String,
    pub ltv: f64,
    pub revenue: f64,
}

/// Non-media acquisition costs folded into the fully-loaded CAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostBreakdown {
    #[serde(alias = "team_costs")]
    pub team_costs: f64,
    #[serde(alias = "tool_costs")]
    pub tool_costs: f64,
    #[serde(alias = "overhead_costs")]
    pub overhead_costs: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.team_costs + self.tool_costs + self.overhead_costs
    }
}

/// Rows decoded from one uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    pub row_count: usize,
}

impl ParsedTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged_json() {
        let row: RawRow =
            serde_json::from_str(r#"{"spend": 12.5, "channel": "Email", "note": null}"#).unwrap();
        assert_eq!(row["spend"], FieldValue::Number(12.5));
        assert_eq!(row["channel"], FieldValue::Text("Email".into()));
        assert!(row["note"].is_blank());
    }

    #[test]
    fn test_cost_breakdown_accepts_both_casings() {
        let camel: CostBreakdown =
            serde_json::from_str(r#"{"teamCosts": 100, "toolCosts": 50}"#).unwrap();
        let snake: CostBreakdown =
            serde_json::from_str(r#"{"team_costs": 100, "overhead_costs": 25}"#).unwrap();
        assert!((camel.total() - 150.0).abs() < f64::EPSILON);
        assert!((snake.total() - 125.0).abs() < f64::EPSILON);
    }
}
