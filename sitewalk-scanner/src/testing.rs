// In-memory fetcher for unit tests.

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::state::Status;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct StubFetcher {
    pages: HashMap<String, FetchOutcome>,
    probes: HashMap<String, Status>,
    fetch_log: Mutex<Vec<String>>,
    probe_log: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serves `html` with a 200 for `url`.
    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.outcome(
            url,
            FetchOutcome::Success {
                status: 200,
                body: html.to_string(),
            },
        )
    }

    pub(crate) fn outcome(mut self, url: &str, outcome: FetchOutcome) -> Self {
        self.pages.insert(url.to_string(), outcome);
        self
    }

    pub(crate) fn probe_status(mut self, url: &str, status: Status) -> Self {
        self.probes.insert(url.to_string(), status);
        self
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub(crate) fn probed(&self) -> Vec<String> {
        self.probe_log.lock().unwrap().clone()
    }

    pub(crate) fn probes_for(&self, url: &str) -> usize {
        self.probe_log
            .lock()
            .unwrap()
            .iter()
            .filter(|probed| probed.as_str() == url)
            .count()
    }
}

impl Fetcher for StubFetcher {
    // Unknown pages are 404s, unknown probe targets answer 200.
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.fetch_log.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or(FetchOutcome::HttpFailure { status: 404 })
    }

    async fn probe(&self, url: &str) -> Status {
        self.probe_log.lock().unwrap().push(url.to_string());
        self.probes.get(url).copied().unwrap_or(Status::Code(200))
    }
}
