use crate::error::Result;
use crate::state::{Status, TransportFailure};
use reqwest::Client;
use reqwest::redirect::Policy;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str =
    concat!("Sitewalk/", env!("CARGO_PKG_VERSION"), " (link auditor)");

const MAX_PAGE_REDIRECTS: usize = 10;

/// Result of fetching a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the decoded body.
    Success { status: u16, body: String },
    /// Any other HTTP status. The body is not read.
    HttpFailure { status: u16 },
    /// No response at all.
    TransportFailure(TransportFailure),
}

impl FetchOutcome {
    pub fn status(&self) -> Status {
        match self {
            FetchOutcome::Success { status, .. } | FetchOutcome::HttpFailure { status } => {
                Status::Code(*status)
            }
            FetchOutcome::TransportFailure(failure) => Status::Failed(*failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Network capability the crawl engine depends on.
///
/// `fetch` retrieves a page for link extraction, `probe` only learns a link
/// target's status. Neither retries.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
    fn probe(&self, url: &str) -> impl Future<Output = Status> + Send;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Whether probes follow redirects or report the 3xx status itself.
    pub follow_probe_redirects: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_probe_redirects: false,
        }
    }
}

/// `reqwest` backed fetcher: GET for pages, HEAD for probes.
pub struct HttpFetcher {
    page_client: Client,
    probe_client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let probe_policy = if config.follow_probe_redirects {
            Policy::limited(MAX_PAGE_REDIRECTS)
        } else {
            Policy::none()
        };

        Ok(Self {
            page_client: Self::client(config, Policy::limited(MAX_PAGE_REDIRECTS))?,
            probe_client: Self::client(config, probe_policy)?,
        })
    }

    fn client(config: &FetcherConfig, redirect: Policy) -> Result<Client> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect)
            .build()?;
        Ok(client)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        debug!("Fetching {}", url);

        let response = match self.page_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportFailure(transport_failure(url, &e)),
        };

        let status = response.status().as_u16();
        if status != 200 {
            return FetchOutcome::HttpFailure { status };
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success { status, body },
            Err(e) => FetchOutcome::TransportFailure(transport_failure(url, &e)),
        }
    }

    async fn probe(&self, url: &str) -> Status {
        debug!("Probing {}", url);

        match self.probe_client.head(url).send().await {
            Ok(response) => Status::Code(response.status().as_u16()),
            Err(e) => Status::Failed(transport_failure(url, &e)),
        }
    }
}

fn transport_failure(url: &str, error: &reqwest::Error) -> TransportFailure {
    warn!("Request to {} failed: {}", url, error);
    if error.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fetcher(config: FetcherConfig) -> HttpFetcher {
        HttpFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_outcome_status() {
        let ok = FetchOutcome::Success {
            status: 200,
            body: String::new(),
        };
        assert_eq!(ok.status(), Status::Code(200));
        assert!(ok.is_success());

        let missing = FetchOutcome::HttpFailure { status: 404 };
        assert_eq!(missing.status(), Status::Code(404));
        assert!(!missing.is_success());

        let timeout = FetchOutcome::TransportFailure(TransportFailure::Timeout);
        assert_eq!(timeout.status(), Status::Failed(TransportFailure::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&mock_server)
            .await;

        let outcome = fetcher(FetcherConfig::default())
            .fetch(&mock_server.uri())
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Success {
                status: 200,
                body: "<a href=\"/x\">x</a>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_http_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410).set_body_string("gone"))
            .mount(&mock_server)
            .await;

        let outcome = fetcher(FetcherConfig::default())
            .fetch(&format!("{}/gone", mock_server.uri()))
            .await;

        assert_eq!(outcome, FetchOutcome::HttpFailure { status: 410 });
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transport_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let config = FetcherConfig {
            timeout: Duration::from_millis(50),
            ..FetcherConfig::default()
        };
        let outcome = fetcher(config)
            .fetch(&format!("{}/slow", mock_server.uri()))
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::TransportFailure(TransportFailure::Timeout)
        );
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        // Nothing listens on port 1 locally
        let outcome = fetcher(FetcherConfig::default())
            .fetch("http://127.0.0.1:1/")
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::TransportFailure(TransportFailure::Error)
        );
    }

    #[tokio::test]
    async fn test_probe_uses_head() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let status = fetcher(FetcherConfig::default())
            .probe(&format!("{}/missing", mock_server.uri()))
            .await;

        assert_eq!(status, Status::Code(404));
    }

    #[tokio::test]
    async fn test_probe_redirect_policy() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let old = format!("{}/old", mock_server.uri());

        let status = fetcher(FetcherConfig::default()).probe(&old).await;
        assert_eq!(status, Status::Code(301));

        let following = FetcherConfig {
            follow_probe_redirects: true,
            ..FetcherConfig::default()
        };
        let status = fetcher(following).probe(&old).await;
        assert_eq!(status, Status::Code(200));
    }
}
