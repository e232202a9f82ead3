use thiserror::Error;

pub type CacResult<T> = Result<T, CacError>;

#[derive(Error, Debug)]
pub enum CacError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Empty file: {0}")]
    EmptyFile(String),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("Spreadsheet parse error: {0}")]
    Workbook(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CacError {
    /// Input-format errors are the caller's fault and never reach the engine.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFileType(_)
                | Self::EmptyFile(_)
                | Self::Csv(_)
                | Self::Workbook(_)
                | Self::InvalidInput(_)
                | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(CacError::UnsupportedFileType("report.pdf".into()).is_input_error());
        assert!(CacError::EmptyFile("spend.csv".into()).is_input_error());
        assert!(CacError::Workbook("q1.xlsx: not a zip archive".into()).is_input_error());
        assert!(!CacError::Config("bad port".into()).is_input_error());
        assert!(!CacError::Internal(anyhow::anyhow!("boom")).is_input_error());
    }
}
