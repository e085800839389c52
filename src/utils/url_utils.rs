//! URL classification utilities.
//!
//! Pure helpers used by the request router, link discovery and the domain
//! novelty tracking. None of them fail: malformed input yields `false`/`None`.

use url::Url;

/// Check if a URL is an absolute HTTP(S) URL
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Host component of a URL, including a non-default port (`example.com:8080`)
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Registrable domain of a URL (`sub.example.co.uk` -> `example.co.uk`)
///
/// Uses the public suffix list. Hosts that are not under a known suffix
/// (`localhost`, bare IP addresses) fall back to the host itself so local
/// fixtures still get a stable domain.
#[must_use]
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    match parsed.host()? {
        url::Host::Domain(_) => {}
        url::Host::Ipv4(_) | url::Host::Ipv6(_) => return Some(host),
    }

    match psl::domain_str(&host) {
        Some(domain) => Some(domain.to_string()),
        None if !host.contains('.') => Some(host),
        None => None,
    }
}

/// Best-effort guess at the file extension of the last path segment
///
/// `https://a.com/files/report.PDF?dl=1` -> `pdf`. Paths without a dotted
/// trailing segment, or with an implausible extension, yield `None`.
#[must_use]
pub fn file_extension_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
