use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request produced no HTTP status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportFailure {
    Timeout,
    Error,
}

/// Outcome of a fetch or probe as it is recorded in the crawl state.
///
/// Serializes as a bare integer for HTTP responses and as `"timeout"` /
/// `"error"` for transport failures. A status that was never determined is
/// represented by `Option::None` (JSON `null`) at the use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Status {
    Code(u16),
    Failed(TransportFailure),
}

impl Status {
    /// 4xx/5xx responses and transport failures.
    pub fn is_broken(&self) -> bool {
        match self {
            Status::Code(code) => *code >= 400,
            Status::Failed(_) => true,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(code) => write!(f, "{}", code),
            Status::Failed(TransportFailure::Timeout) => f.write_str("timeout"),
            Status::Failed(TransportFailure::Error) => f.write_str("error"),
        }
    }
}

/// Renders an optional status for tables: empty when unknown.
pub fn status_cell(status: Option<Status>) -> String {
    status.map(|s| s.to_string()).unwrap_or_default()
}

/// A link as seen from one specific page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkObservation {
    pub url: String,
    pub is_absolute: bool,
    pub opens_new_window: bool,
    pub scheme: String,
    pub nofollow: bool,
    pub external: bool,
    pub status_code: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub status_code: Option<Status>,
    pub links: Vec<LinkObservation>,
}

impl PageRecord {
    /// A page that was fetched but yielded no links (non-200 or transport failure).
    pub fn dead_end(status: Status) -> Self {
        Self {
            status_code: Some(status),
            links: Vec::new(),
        }
    }

    pub fn with_links(status: Status, links: Vec<LinkObservation>) -> Self {
        Self {
            status_code: Some(status),
            links,
        }
    }
}

/// Registry entry for one unique link target across the whole crawl.
///
/// Classification fields are frozen at first sighting; only
/// `referring_pages` grows. An unknown `status_code` may be filled in by a
/// later sighting or by the internal backfill once the traversal is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub is_absolute: bool,
    pub opens_new_window: bool,
    pub scheme: String,
    pub nofollow: bool,
    pub external: bool,
    pub status_code: Option<Status>,
    #[serde(rename = "pages")]
    pub referring_pages: IndexSet<String>,
}

impl LinkEntry {
    fn first_sighting(observation: &LinkObservation, page_url: &str) -> Self {
        let mut referring_pages = IndexSet::new();
        referring_pages.insert(page_url.to_string());
        Self {
            is_absolute: observation.is_absolute,
            opens_new_window: observation.opens_new_window,
            scheme: observation.scheme.clone(),
            nofollow: observation.nofollow,
            external: observation.external,
            status_code: observation.status_code,
            referring_pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.referring_pages.len()
    }
}

/// Every unique link target seen during the crawl, keyed by canonical URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkRegistry {
    entries: IndexMap<String, LinkEntry>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&LinkEntry> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Status already recorded for `url`, if any. This is the probe cache.
    pub fn cached_status(&self, url: &str) -> Option<Status> {
        self.entries.get(url).and_then(|entry| entry.status_code)
    }

    /// Records a sighting of `observation` on `page_url`.
    ///
    /// Returns `true` when the target was new. Existing entries gain the
    /// referring page, and a missing status is filled from the observation.
    /// A recorded status is never overwritten.
    pub fn upsert(&mut self, observation: &LinkObservation, page_url: &str) -> bool {
        match self.entries.get_mut(&observation.url) {
            Some(entry) => {
                entry.referring_pages.insert(page_url.to_string());
                if entry.status_code.is_none() {
                    entry.status_code = observation.status_code;
                }
                false
            }
            None => {
                self.entries.insert(
                    observation.url.clone(),
                    LinkEntry::first_sighting(observation, page_url),
                );
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LinkEntry)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut LinkEntry)> {
        self.entries.iter_mut()
    }
}

/// The three collections a crawl accumulates. Field names follow the
/// snapshot document layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    #[serde(rename = "visited_pages")]
    pub visited: IndexSet<String>,
    #[serde(rename = "pages_data")]
    pub pages: IndexMap<String, PageRecord>,
    #[serde(rename = "links_data")]
    pub links: LinkRegistry,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty() && self.pages.is_empty() && self.links.is_empty()
    }
}
