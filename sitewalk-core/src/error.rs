use sitewalk_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// The seed was rejected before any page was recorded.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Scan(e) if e.is_validation())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
