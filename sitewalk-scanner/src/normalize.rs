use crate::error::{Result, ScanError};
use url::Url;

/// An href resolved against the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLink {
    /// Absolute URL with the fragment removed.
    pub url: Url,
    /// Whether the author wrote a full URL (with a network location) rather than a path.
    pub is_absolute: bool,
    pub scheme: String,
}

/// Resolves `href` against `page_url`, strips the fragment and classifies it.
///
/// Returns `None` for hrefs the crawl ignores: empty values, `javascript:`
/// and `mailto:` links, unresolvable references and anything that does not
/// end up as http/https.
pub fn normalize(href: &str, page_url: &Url) -> Option<NormalizedLink> {
    if href.trim().is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    let mut resolved = page_url.join(href).ok()?;
    resolved.set_fragment(None);

    if !is_http_scheme(resolved.scheme()) {
        return None;
    }

    Some(NormalizedLink {
        scheme: resolved.scheme().to_string(),
        is_absolute: has_network_location(href),
        url: resolved,
    })
}

/// `host[:port]` of a URL. The port only appears when it was written
/// explicitly and differs from the scheme default.
pub fn netloc(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Same as [`netloc`] for a URL kept as a string; `None` if it does not parse.
pub fn netloc_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| netloc(&u))
}

/// Validates the crawl's starting URL: http/https with a host.
pub fn parse_seed(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)
        .map_err(|e| ScanError::InvalidUrl(format!("'{}': {}", trimmed, e)))?;

    if !is_http_scheme(url.scheme()) {
        return Err(ScanError::InvalidUrl(format!(
            "'{}': scheme must be http or https",
            trimmed
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScanError::InvalidUrl(format!("'{}': missing host", trimmed)));
    }

    url.set_fragment(None);
    Ok(url)
}

fn is_http_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

// "scheme://host..." or "//host..." as authored, before any resolution.
fn has_network_location(href: &str) -> bool {
    let rest = match href.split_once(':') {
        Some((scheme, rest)) if is_scheme_name(scheme) => rest,
        _ => href,
    };

    rest.strip_prefix("//")
        .is_some_and(|authority| !authority.is_empty() && !authority.starts_with(['/', '?', '#']))
}

fn is_scheme_name(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
