//! Upload dispatch by file extension.

use crate::csv_rows::{parse_csv, parse_json_rows};
use crate::workbook::parse_workbook;
use cac_core::{CacError, CacResult, ParsedTable};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Json,
    /// Excel workbook (`.xlsx` or legacy `.xls`).
    Workbook,
}

/// Resolve the decoder for `filename` from its extension.
pub fn detect_format(filename: &str) -> CacResult<UploadFormat> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => Ok(UploadFormat::Csv),
        Some("json") => Ok(UploadFormat::Json),
        Some("xlsx") | Some("xls") => Ok(UploadFormat::Workbook),
        _ => Err(CacError::UnsupportedFileType(filename.to_string())),
    }
}

pub fn parse_upload(filename: &str, bytes: &[u8]) -> CacResult<ParsedTable> {
    let format = detect_format(filename).inspect_err(|e| {
        warn!(filename, error = %e, "Rejected upload");
    })?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CacError::EmptyFile(filename.to_string()));
    }

    let table = match format {
        UploadFormat::Csv => parse_csv(bytes)?,
        UploadFormat::Json => parse_json_rows(bytes)?,
        UploadFormat::Workbook => parse_workbook(bytes)?,
    };
    info!(
        filename,
        format = ?format,
        rows = table.row_count,
        columns = table.columns.len(),
        "Upload parsed"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("spend.CSV").unwrap(), UploadFormat::Csv);
        assert_eq!(detect_format("rows.json").unwrap(), UploadFormat::Json);
        assert_eq!(detect_format("q1.xlsx").unwrap(), UploadFormat::Workbook);
        assert_eq!(detect_format("legacy.XLS").unwrap(), UploadFormat::Workbook);
        assert!(matches!(
            detect_format("report.pdf"),
            Err(CacError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            detect_format("notes"),
            Err(CacError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_workbook_dispatch() {
        assert!(matches!(
            parse_upload("q1.xlsx", b"PK\x03\x04 truncated"),
            Err(CacError::Workbook(_))
        ));
    }

    #[test]
    fn test_blank_body_is_empty_file() {
        assert!(matches!(
            parse_upload("spend.csv", b"  \n"),
            Err(CacError::EmptyFile(_))
        ));
    }
}
