use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Seed URL {url} did not return HTTP 200 (got {status})")]
    SeedRejected { url: String, status: String },

    #[error("Seed domain {seed_domain} does not match the resumed crawl of {snapshot_domain}")]
    ResumeMismatch {
        seed_domain: String,
        snapshot_domain: String,
    },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    /// True for errors that reject the seed before any crawling happens.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidUrl(_)
                | ScanError::SeedRejected { .. }
                | ScanError::ResumeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
