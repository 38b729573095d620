pub mod anchor;
pub mod classify;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod testing;

pub use crawler::{CrawlConfig, Crawler, ProgressCallback};
pub use error::ScanError;
pub use fetcher::{FetchOutcome, Fetcher, FetcherConfig, HttpFetcher};
pub use state::{CrawlState, LinkEntry, LinkObservation, LinkRegistry, PageRecord, Status};
