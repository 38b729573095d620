use crate::anchor::extract_anchors;
use crate::classify::classify_page;
use crate::error::{Result, ScanError};
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::normalize::{netloc, netloc_of, parse_seed};
use crate::snapshot::save_snapshot;
use crate::state::{CrawlState, PageRecord, Status};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// Called once per dequeued page with the running page count and the page URL.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Write the rolling snapshot after this many successfully parsed pages. 0 disables it.
    pub progress_interval: usize,
    /// Stop dequeuing once this many pages have been recorded.
    pub max_pages: Option<usize>,
    /// Never enqueue pages further than this many hops from the seed.
    pub max_depth: Option<usize>,
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_pages: None,
            max_depth: None,
            checkpoint_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueItem {
    url: String,
    depth: usize,
}

/// FIFO of pages waiting to be fetched, with O(1) "already queued" checks.
#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<QueueItem>,
    queued: HashSet<String>,
}

impl Frontier {
    fn push(&mut self, url: String, depth: usize) -> bool {
        if !self.queued.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(QueueItem { url, depth });
        true
    }

    fn pop(&mut self) -> Option<QueueItem> {
        let item = self.queue.pop_front()?;
        self.queued.remove(&item.url);
        Some(item)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Breadth-first crawler over a single site.
///
/// The crawler owns the visited set, the page records and the link registry
/// for the whole run. Pages are fetched one at a time; every same-domain link
/// found on a 200 page is queued unless it was already visited or queued.
pub struct Crawler<F: Fetcher> {
    fetcher: F,
    config: CrawlConfig,
    state: CrawlState,
    frontier: Frontier,
    base_domain: Option<String>,
    parsed_pages: usize,
    depth_skipped: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            config: CrawlConfig::default(),
            state: CrawlState::new(),
            frontier: Frontier::default(),
            base_domain: None,
            parsed_pages: 0,
            depth_skipped: 0,
            progress_callback: None,
        }
    }

    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.config.progress_interval = interval;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = Some(max_pages);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = Some(max_depth);
        self
    }

    pub fn with_checkpoint_path(mut self, path: PathBuf) -> Self {
        self.config.checkpoint_path = Some(path);
        self
    }

    /// Continue from previously restored state instead of starting empty.
    pub fn with_state(mut self, state: CrawlState) -> Self {
        self.state = state;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn into_state(self) -> CrawlState {
        self.state
    }

    pub fn base_domain(&self) -> Option<&str> {
        self.base_domain.as_deref()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Crawls from `seed` until the frontier is empty or a cap is hit.
    ///
    /// On a fresh crawl the seed must answer 200, otherwise
    /// [`ScanError::SeedRejected`] is returned before anything is recorded.
    /// When the crawler holds restored state the frontier is rebuilt from it
    /// and already visited pages are not fetched again.
    pub async fn crawl(&mut self, seed: &str) -> Result<&IndexSet<String>> {
        let seed_url = parse_seed(seed)?;
        let base_domain = netloc(&seed_url);
        let seed_key = String::from(seed_url);
        self.base_domain = Some(base_domain.clone());

        if self.state.visited.is_empty() {
            info!("Starting crawl of {} (base domain {})", seed_key, base_domain);

            let outcome = self.fetcher.fetch(&seed_key).await;
            if !outcome.is_success() {
                return Err(ScanError::SeedRejected {
                    url: seed_key,
                    status: outcome.status().to_string(),
                });
            }
            let seed_item = QueueItem {
                url: seed_key,
                depth: 0,
            };
            self.process_page(seed_item, outcome, &base_domain).await;
        } else {
            if let Some(snapshot_domain) = self.foreign_domain(&base_domain) {
                return Err(ScanError::ResumeMismatch {
                    seed_domain: base_domain,
                    snapshot_domain,
                });
            }
            self.rebuild_frontier(&seed_key, &base_domain);
            info!(
                "Resuming crawl of {}: {} pages already visited, {} queued",
                seed_key,
                self.state.visited.len(),
                self.frontier.len()
            );
        }

        while let Some(item) = self.frontier.pop() {
            if self.state.visited.contains(&item.url) {
                continue;
            }

            if let Some(max_pages) = self.config.max_pages
                && self.state.pages.len() >= max_pages
            {
                warn!(
                    "Page limit of {} reached, {} queued URLs left unvisited",
                    max_pages,
                    self.frontier.len() + 1
                );
                break;
            }

            let outcome = self.fetcher.fetch(&item.url).await;
            self.process_page(item, outcome, &base_domain).await;
        }

        if let Some(max_depth) = self.config.max_depth
            && self.depth_skipped > 0
        {
            warn!(
                "Depth limit of {} reached, {} links were not followed",
                max_depth, self.depth_skipped
            );
        }
        info!(
            "Crawl complete. Visited {} pages, found {} unique links",
            self.state.visited.len(),
            self.state.links.len()
        );
        Ok(&self.state.visited)
    }

    /// Fills in the status of internal links once the traversal is over.
    ///
    /// Targets that were crawled take the status of their page record; the
    /// rest (never reached, e.g. because of a cap) are probed directly. The
    /// backfilled status is copied into each page's internal link
    /// observations as well.
    pub async fn finalize(&mut self) {
        let mut probed = 0;

        for (url, entry) in self.state.links.iter_mut() {
            if entry.external {
                continue;
            }
            entry.status_code = match self.state.pages.get(url) {
                Some(page) => page.status_code,
                None => {
                    probed += 1;
                    Some(self.fetcher.probe(url).await)
                }
            };
        }

        for page in self.state.pages.values_mut() {
            for link in page.links.iter_mut().filter(|link| !link.external) {
                link.status_code = self
                    .state
                    .links
                    .get(&link.url)
                    .and_then(|entry| entry.status_code);
            }
        }

        info!("Backfilled internal link statuses ({} probed directly)", probed);
    }

    async fn process_page(&mut self, item: QueueItem, outcome: FetchOutcome, base_domain: &str) {
        let started = Instant::now();
        let QueueItem { url, depth } = item;

        if let Some(ref callback) = self.progress_callback {
            callback(self.state.visited.len() + 1, url.clone());
        }
        debug!("Processing [depth {}] {}", depth, url);

        let (status, body) = match outcome {
            FetchOutcome::TransportFailure(failure) => {
                warn!("Could not fetch {}: {}", url, Status::Failed(failure));
                self.record(url, PageRecord::dead_end(Status::Failed(failure)));
                return;
            }
            FetchOutcome::HttpFailure { status } => {
                warn!("Page {} returned status {}", url, status);
                self.record(url, PageRecord::dead_end(Status::Code(status)));
                return;
            }
            FetchOutcome::Success { status, body } => (status, body),
        };

        let page_url = match Url::parse(&url) {
            Ok(page_url) => page_url,
            Err(e) => {
                warn!("Skipping links of unparseable page URL {}: {}", url, e);
                self.record(url, PageRecord::dead_end(Status::Code(status)));
                return;
            }
        };

        let anchors = extract_anchors(&body);
        let links = classify_page(
            &anchors,
            &page_url,
            base_domain,
            &mut self.state.links,
            &self.fetcher,
        )
        .await;

        let internal = links.iter().filter(|link| !link.external).count();
        info!(
            "OK {} in {:.2}s: {} internal and {} external links",
            url,
            started.elapsed().as_secs_f64(),
            internal,
            links.len() - internal
        );

        let next: Vec<String> = links
            .iter()
            .filter(|link| !link.external && netloc_of(&link.url).as_deref() == Some(base_domain))
            .map(|link| link.url.clone())
            .collect();

        self.record(url, PageRecord::with_links(Status::Code(status), links));
        self.enqueue(next, depth + 1);

        self.parsed_pages += 1;
        if self.config.progress_interval > 0
            && self.parsed_pages % self.config.progress_interval == 0
        {
            self.checkpoint();
        }
    }

    fn record(&mut self, url: String, record: PageRecord) {
        self.state.pages.insert(url.clone(), record);
        self.state.visited.insert(url);
    }

    fn enqueue(&mut self, urls: Vec<String>, depth: usize) {
        if let Some(max_depth) = self.config.max_depth
            && depth > max_depth
        {
            let unvisited = urls
                .iter()
                .filter(|url| !self.state.visited.contains(*url))
                .count();
            if unvisited > 0 {
                debug!("Depth limit {} reached, not following {} links", max_depth, unvisited);
                self.depth_skipped += unvisited;
            }
            return;
        }

        for url in urls {
            if !self.state.visited.contains(&url) && self.frontier.push(url.clone(), depth) {
                debug!("Queued [depth {}] {}", depth, url);
            }
        }
    }

    fn checkpoint(&self) {
        if let Some(ref path) = self.config.checkpoint_path
            && let Err(e) = save_snapshot(path, &self.state)
        {
            error!("Failed to write snapshot {}: {}", path.display(), e);
        }
    }

    /// Netloc of the first restored page that lies outside `base_domain`.
    fn foreign_domain(&self, base_domain: &str) -> Option<String> {
        self.state.visited.iter().find_map(|url| {
            let domain = netloc_of(url).unwrap_or_default();
            (domain != base_domain).then_some(domain)
        })
    }

    // Walks the recorded page graph breadth-first from the seed so unvisited
    // targets are queued in hop order with their depth.
    fn rebuild_frontier(&mut self, seed: &str, base_domain: &str) {
        let mut depths: HashMap<String, usize> = HashMap::new();
        let mut walk = VecDeque::new();
        depths.insert(seed.to_string(), 0);
        walk.push_back(seed.to_string());

        while let Some(url) = walk.pop_front() {
            let depth = depths[&url];

            if !self.state.visited.contains(&url) {
                let within_depth = self.config.max_depth.is_none_or(|max| depth <= max);
                if within_depth {
                    self.frontier.push(url, depth);
                }
                continue;
            }

            let Some(record) = self.state.pages.get(&url) else {
                continue;
            };
            for link in &record.links {
                if link.external || netloc_of(&link.url).as_deref() != Some(base_domain) {
                    continue;
                }
                if !depths.contains_key(&link.url) {
                    depths.insert(link.url.clone(), depth + 1);
                    walk.push_back(link.url.clone());
                }
            }
        }
    }
}
