//! CSV and JSON row decoding.

use crate::coerce::{coerce_cell, looks_numeric};
use cac_core::{CacError, CacResult, FieldValue, ParsedTable, RawRow};
use csv::{ReaderBuilder, Trim};
use tracing::debug;

/// Decode comma-delimited, double-quote-escaped CSV with a required header
/// row. Short rows are accepted; missing trailing cells are simply absent.
pub fn parse_csv(bytes: &[u8]) -> CacResult<ParsedTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| CacError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(CacError::EmptyFile("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| CacError::Csv(format!("row {}: {e}", index + 2)))?;
        let row: RawRow = columns
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .filter_map(|(name, cell)| coerce_cell(cell).map(|value| (name.clone(), value)))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(CacError::EmptyFile("no data rows".to_string()));
    }
    debug!(columns = columns.len(), rows = rows.len(), "Parsed CSV");
    Ok(ParsedTable::new(columns, rows))
}

/// Decode a JSON array of flat row objects. Numeric-looking strings are
/// coerced the same way CSV cells are; nulls are dropped.
pub fn parse_json_rows(bytes: &[u8]) -> CacResult<ParsedTable> {
    let decoded: Vec<RawRow> = serde_json::from_slice(bytes)?;
    if decoded.is_empty() {
        return Err(CacError::EmptyFile("no data rows".to_string()));
    }

    let mut columns: Vec<String> = Vec::new();
    let rows: Vec<RawRow> = decoded
        .into_iter()
        .map(|row| {
            row.into_iter()
                .filter_map(|(name, value)| match value {
                    FieldValue::Null => None,
                    FieldValue::Text(s) if looks_numeric(s.trim()) => {
                        coerce_cell(&s).map(|v| (name, v))
                    }
                    other => Some((name, other)),
                })
                .collect::<RawRow>()
        })
        .inspect(|row| {
            for name in row.keys() {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        })
        .collect();

    Ok(ParsedTable::new(columns, rows))
}
