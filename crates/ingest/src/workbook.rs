//! Excel workbook decoding. The first worksheet is read with its first row
//! as the header, the same way a CSV export of that sheet would be.

use crate::coerce::coerce_cell;
use cac_core::{CacError, CacResult, FieldValue, ParsedTable, RawRow};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

pub fn parse_workbook(bytes: &[u8]) -> CacResult<ParsedTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CacError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CacError::EmptyFile("workbook has no worksheets".to_string()))?
        .map_err(|e| CacError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let columns: Vec<String> = sheet_rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(CacError::EmptyFile("missing header row".to_string()));
    }

    let rows: Vec<RawRow> = sheet_rows
        .map(|cells| {
            columns
                .iter()
                .zip(cells)
                .filter(|(name, _)| !name.is_empty())
                .filter_map(|(name, cell)| cell_value(cell).map(|value| (name.clone(), value)))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    if rows.is_empty() {
        return Err(CacError::EmptyFile("no data rows".to_string()));
    }
    debug!(columns = columns.len(), rows = rows.len(), "Parsed workbook");
    Ok(ParsedTable::new(columns, rows))
}

/// Typed cells keep their type; text cells go through the same numeric
/// coercion as CSV. Date cells become `YYYY-MM-DD` text.
pub fn cell_value(cell: &Data) -> Option<FieldValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(n) => Some(FieldValue::Number(*n as f64)),
        Data::Float(n) => Some(FieldValue::Number(*n)),
        Data::Bool(b) => Some(FieldValue::Bool(*b)),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => coerce_cell(s),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Some(FieldValue::Text(ts.format("%Y-%m-%d").to_string())),
            None => Some(FieldValue::Number(dt.as_f64())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Int(12)), Some(FieldValue::Number(12.0)));
        assert_eq!(cell_value(&Data::Float(1250.5)), Some(FieldValue::Number(1250.5)));
        assert_eq!(
            cell_value(&Data::String(" 300 ".into())),
            Some(FieldValue::Number(300.0))
        );
        assert_eq!(
            cell_value(&Data::String("Google Ads".into())),
            Some(FieldValue::Text("Google Ads".into()))
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-01-05".into())),
            Some(FieldValue::Text("2024-01-05".into()))
        );
        assert_eq!(cell_value(&Data::Bool(true)), Some(FieldValue::Bool(true)));
        assert_eq!(cell_value(&Data::Empty), None);
        assert_eq!(cell_value(&Data::Error(CellErrorType::Div0)), None);
    }

    #[test]
    fn test_corrupt_workbook_is_input_error() {
        let err = parse_workbook(b"PK not really a zip").unwrap_err();
        assert!(matches!(err, CacError::Workbook(_)));
        assert!(err.is_input_error());
    }
}
