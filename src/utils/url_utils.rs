//! URL helpers for the crawled platform.
//!
//! Host recognition across device prefixes, redirect decoding for outbound
//! links, and the normalized host forms used for keying and navigation.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::constants::{
    DEVICE_HOST_PREFIXES, LINK_REDIRECT_PATTERN, MOBILE_HOST, PLATFORM_DOMAIN,
    VIDEO_QUERY_WHITELIST,
};

static LINK_REDIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LINK_REDIRECT_PATTERN).expect("Invalid link redirect regex"));

/// Check if a URL is a valid http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Whether `host` is the platform domain, bare or behind a known device prefix.
#[must_use]
pub fn is_platform_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    if host == PLATFORM_DOMAIN {
        return true;
    }
    match host.strip_suffix(PLATFORM_DOMAIN) {
        Some(prefix) => prefix
            .strip_suffix('.')
            .is_some_and(|p| DEVICE_HOST_PREFIXES.contains(&p)),
        None => false,
    }
}

/// Resolve a possibly relative href against the mobile host.
#[must_use]
pub fn resolve_href(href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(&format!("https://{MOBILE_HOST}/")).ok()?;
            base.join(href).ok()
        }
        Err(_) => None,
    }
}

/// Decode the true destination of an outbound redirect link.
///
/// Returns `None` when `href` is not a platform redirect or carries no `u`
/// parameter. The `url` crate already percent-decodes query values.
#[must_use]
pub fn decode_redirect_target(href: &str) -> Option<String> {
    let url = resolve_href(href)?;
    if !LINK_REDIRECT_RE.is_match(url.as_str()) {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.into_owned())
        .filter(|target| is_valid_url(target))
}

/// Rewrite a platform URL onto the mobile host, keeping path and query.
#[must_use]
pub fn to_mobile_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.host_str().is_some_and(is_platform_host) => {
            if parsed.set_host(Some(MOBILE_HOST)).is_ok() && parsed.set_scheme("https").is_ok() {
                parsed.to_string()
            } else {
                url.to_string()
            }
        }
        _ => url.to_string(),
    }
}

/// Normalize an "open video" href into a stable sub-page URL.
///
/// Relative hrefs are resolved, the host is rewritten to the mobile host,
/// tracking parameters are dropped (only `VIDEO_QUERY_WHITELIST` survives) and
/// the fragment is removed. Non-platform links yield `None`.
#[must_use]
pub fn normalize_video_url(href: &str) -> Option<String> {
    let mut url = resolve_href(href)?;
    if !url.host_str().is_some_and(is_platform_host) {
        return None;
    }
    url.set_host(Some(MOBILE_HOST)).ok()?;
    url.set_scheme("https").ok()?;
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| VIDEO_QUERY_WHITELIST.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Some(url.to_string())
}
