use crate::anchor::Anchor;
use crate::fetcher::Fetcher;
use crate::normalize::{netloc, normalize};
use crate::state::{LinkObservation, LinkRegistry};
use tracing::debug;
use url::Url;

/// Classifies one anchor found on `page_url` and records it in the registry.
///
/// Returns `None` when the href is skipped by normalization. External
/// targets are probed only when the registry holds no status for them yet,
/// so each unique external URL costs at most one probe per crawl. Internal
/// targets keep a `None` status until the crawl is finalized.
pub async fn classify<F: Fetcher>(
    anchor: &Anchor,
    page_url: &Url,
    base_domain: &str,
    registry: &mut LinkRegistry,
    fetcher: &F,
) -> Option<LinkObservation> {
    let href = anchor.href.as_deref()?;
    let link = normalize(href, page_url)?;

    let target_netloc = netloc(&link.url);
    let external = !target_netloc.is_empty() && target_netloc != base_domain;
    let url = String::from(link.url);

    let status_code = if external {
        match registry.cached_status(&url) {
            Some(status) => {
                debug!("Reusing status {} for {}", status, url);
                Some(status)
            }
            None => Some(fetcher.probe(&url).await),
        }
    } else {
        None
    };

    let observation = LinkObservation {
        url,
        is_absolute: link.is_absolute,
        opens_new_window: anchor.opens_new_window(),
        scheme: link.scheme,
        nofollow: anchor.is_nofollow(),
        external,
        status_code,
    };
    registry.upsert(&observation, page_url.as_str());

    Some(observation)
}

/// Classifies every anchor of a page, preserving document order.
pub async fn classify_page<F: Fetcher>(
    anchors: &[Anchor],
    page_url: &Url,
    base_domain: &str,
    registry: &mut LinkRegistry,
    fetcher: &F,
) -> Vec<LinkObservation> {
    let mut links = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        if let Some(observation) = classify(anchor, page_url, base_domain, registry, fetcher).await {
            links.push(observation);
        }
    }
    links
}
