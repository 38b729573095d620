use crate::error::Result;
use crate::report::save_csv_reports;
use indicatif::{ProgressBar, ProgressStyle};
use sitewalk_scanner::crawler::DEFAULT_PROGRESS_INTERVAL;
use sitewalk_scanner::fetcher::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use sitewalk_scanner::snapshot::{FINAL_SNAPSHOT, ROLLING_SNAPSHOT, load_snapshot, save_snapshot};
use sitewalk_scanner::{CrawlConfig, CrawlState, Crawler, Fetcher, FetcherConfig, HttpFetcher};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub seed: String,
    /// Snapshots and CSV tables are written here.
    pub output_dir: PathBuf,
    pub progress_interval: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_pages: Option<usize>,
    pub max_depth: Option<usize>,
    /// Let probes follow redirects instead of reporting the 3xx itself.
    pub follow_redirects: bool,
    /// Continue from this snapshot instead of starting fresh.
    pub resume_from: Option<PathBuf>,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            output_dir: PathBuf::from("."),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: None,
            max_depth: None,
            follow_redirects: false,
            resume_from: None,
            show_progress_bars: false,
        }
    }

    fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            follow_probe_redirects: self.follow_redirects,
        }
    }

    fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            progress_interval: self.progress_interval,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            checkpoint_path: Some(self.output_dir.join(ROLLING_SNAPSHOT)),
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a finished crawl produced.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub seed: String,
    pub base_domain: String,
    pub state: CrawlState,
    pub final_snapshot: PathBuf,
    pub pages_csv: PathBuf,
    pub links_csv: PathBuf,
    pub elapsed: Duration,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl over HTTP with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    let fetcher = HttpFetcher::new(&options.fetcher_config())?;
    execute_crawl_with(fetcher, options, progress_callback).await
}

/// Runs the whole pipeline with the given fetcher: traversal, internal
/// status backfill, final snapshot and CSV tables.
pub async fn execute_crawl_with<F: Fetcher>(
    fetcher: F,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    let started = Instant::now();
    fs::create_dir_all(&options.output_dir)?;

    let state = match options.resume_from {
        Some(ref path) => {
            if let Some(ref callback) = progress_callback {
                callback(format!("Resuming from {}", path.display()));
            }
            load_snapshot(path)?
        }
        None => CrawlState::new(),
    };

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let mut crawler = Crawler::new(fetcher)
        .with_config(options.crawl_config())
        .with_state(state);

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |count: usize, url: String| {
            pb_clone.set_message(format!(
                "Crawling... {} pages processed ({})",
                count,
                extract_url_path(&url)
            ));
        }));
    }

    if let Err(e) = crawler.crawl(&options.seed).await {
        if let Some(ref pb) = progress_bar {
            pb.finish_and_clear();
        }
        return Err(e.into());
    }

    if let Some(ref pb) = progress_bar {
        pb.set_message("Checking internal link statuses...");
    }
    crawler.finalize().await;

    let base_domain = crawler.base_domain().unwrap_or_default().to_string();
    let state = crawler.into_state();

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!("Crawl complete! {} pages processed", state.pages.len()));
    }

    let final_snapshot = options.output_dir.join(FINAL_SNAPSHOT);
    save_snapshot(&final_snapshot, &state)?;

    let (pages_csv, links_csv) = save_csv_reports(&options.output_dir, &base_domain, &state)?;
    info!(
        "Reports written to {} and {}",
        pages_csv.display(),
        links_csv.display()
    );

    Ok(CrawlOutcome {
        seed: options.seed,
        base_domain,
        state,
        final_snapshot,
        pages_csv,
        links_csv,
        elapsed: started.elapsed(),
    })
}
