//! Upload ingestion: decodes CSV, JSON, and Excel row files into raw rows with
//! opportunistic numeric coercion.
//!
//! Input-format problems (unsupported extension, empty body, malformed CSV)
//! are reported here so the metrics engine only ever sees decoded rows.

pub mod coerce;
pub mod csv_rows;
pub mod upload;
pub mod workbook;

pub use csv_rows::{parse_csv, parse_json_rows};
pub use upload::{detect_format, parse_upload, UploadFormat};
pub use workbook::parse_workbook;
