//! Content pass: parse the loaded post DOM into a `PostRecord`
//!
//! Runs on the serialized DOM with `scraper`, so it is a pure function of the
//! HTML and the canonical URL.

use chrono::{DateTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::schema::{ImageRef, LinkRef, PostRecord};
use crate::utils::constants::{
    ASSET_HOST_PATTERN, AVATAR_SELECTOR, CONTENT_CONTAINER_SELECTOR, HEADER_SELECTOR,
    LIGHTBOX_ANCHOR_SELECTOR, LINK_DOMAIN_SELECTOR, LINK_TITLE_SELECTOR, OUTBOUND_LINK_SELECTOR,
    TEXT_SELECTOR, TIMESTAMP_SELECTOR, VIDEO_ANCHOR_SELECTOR, VIDEO_ELEMENT_SELECTOR,
};
use crate::utils::{decode_redirect_target, non_empty_text, normalize_video_url, resolve_href};

/// Failures of the content pass
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The expected content region is absent: layout drift or a render race.
    #[error("missing-content: `{selector}` not found on {url}")]
    MissingContent { url: String, selector: &'static str },

    /// The page could not hand over its DOM.
    #[error("page content unavailable: {0:#}")]
    Page(anyhow::Error),
}

static CONTENT_CONTAINER: Lazy<Selector> = Lazy::new(|| compile(CONTENT_CONTAINER_SELECTOR));
static HEADER: Lazy<Selector> = Lazy::new(|| compile(HEADER_SELECTOR));
static AVATAR: Lazy<Selector> = Lazy::new(|| compile(AVATAR_SELECTOR));
static TEXT: Lazy<Selector> = Lazy::new(|| compile(TEXT_SELECTOR));
static TIMESTAMP: Lazy<Selector> = Lazy::new(|| compile(TIMESTAMP_SELECTOR));
static LIGHTBOX_ANCHOR: Lazy<Selector> = Lazy::new(|| compile(LIGHTBOX_ANCHOR_SELECTOR));
static OUTBOUND_LINK: Lazy<Selector> = Lazy::new(|| compile(OUTBOUND_LINK_SELECTOR));
static LINK_TITLE: Lazy<Selector> = Lazy::new(|| compile(LINK_TITLE_SELECTOR));
static LINK_DOMAIN: Lazy<Selector> = Lazy::new(|| compile(LINK_DOMAIN_SELECTOR));
static VIDEO_ELEMENT: Lazy<Selector> = Lazy::new(|| compile(VIDEO_ELEMENT_SELECTOR));
static VIDEO_ANCHOR: Lazy<Selector> = Lazy::new(|| compile(VIDEO_ANCHOR_SELECTOR));
static ANCHOR: Lazy<Selector> = Lazy::new(|| compile("a"));
static IMG: Lazy<Selector> = Lazy::new(|| compile("img[src]"));
static SVG_IMAGE: Lazy<Selector> = Lazy::new(|| compile("image"));

static ASSET_HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(ASSET_HOST_PATTERN).expect("Invalid asset host regex"));
static CSS_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("Invalid CSS url regex")
});
static CSS_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([0-9a-fA-F]{1,6})\s?").expect("Invalid CSS escape regex"));

fn compile(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("Invalid selector `{selector}`: {e}"))
}

/// Extract the post body, author header, media and outbound links.
///
/// Stats are filled by the separate stats pass.
///
/// # Errors
/// `ExtractionError::MissingContent` when the content container is absent.
pub fn extract_content(html: &str, canonical_url: &str) -> Result<PostRecord, ExtractionError> {
    let document = Html::parse_document(html);

    let container = document.select(&CONTENT_CONTAINER).next().ok_or_else(|| {
        ExtractionError::MissingContent {
            url: canonical_url.to_string(),
            selector: CONTENT_CONTAINER_SELECTOR,
        }
    })?;

    let mut record = PostRecord {
        post_url: Some(canonical_url.to_string()),
        post_date: extract_post_date(&document),
        post_text: extract_text(container),
        ..PostRecord::default()
    };

    let header = container
        .select(&HEADER)
        .next()
        .or_else(|| document.select(&HEADER).next());
    if let Some(header) = header {
        record.author_name = header
            .select(&ANCHOR)
            .find_map(|anchor| non_empty_text(&anchor.text().collect::<String>()));
        record.author_avatar = header.select(&AVATAR).next().and_then(avatar_source);
    }

    for image in extract_images(container) {
        record.push_image(image);
    }
    for link in extract_links(container) {
        record.push_link(link);
    }
    record.pending_video_url = extract_pending_video(container);

    Ok(record)
}

/// Read the structured timestamp and render it as RFC 3339 UTC.
fn extract_post_date(document: &Html) -> Option<String> {
    document.select(&TIMESTAMP).find_map(|node| {
        let element = node.value();
        let seconds = element
            .attr("data-store")
            .and_then(|store| serde_json::from_str::<serde_json::Value>(store).ok())
            .and_then(|store| store.get("time").and_then(serde_json::Value::as_i64))
            .or_else(|| element.attr("data-utime").and_then(|t| t.trim().parse().ok()))?;
        DateTime::from_timestamp(seconds, 0)
            .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
    })
}

fn extract_text(container: ElementRef<'_>) -> Option<String> {
    let paragraphs: Vec<String> = container
        .select(&TEXT)
        .filter_map(|p| non_empty_text(&p.text().collect::<String>()))
        .collect();
    if !paragraphs.is_empty() {
        return Some(paragraphs.join("\n"));
    }

    // No paragraphs: fall back to the container text outside the header
    let text: String = container
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| element.name() == HEADER_SELECTOR)
            })
        })
        .filter_map(|node| node.value().as_text().map(|text| text.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    non_empty_text(&text)
}

fn extract_images(container: ElementRef<'_>) -> Vec<ImageRef> {
    let mut images = Vec::new();
    for anchor in container.select(&LIGHTBOX_ANCHOR) {
        let Some(link) = anchor.value().attr("href").and_then(resolve_href) else {
            continue;
        };
        for img in anchor.select(&IMG) {
            if let Some(src) = img.value().attr("src")
                && ASSET_HOST_RE.is_match(src)
            {
                images.push(ImageRef {
                    link: link.to_string(),
                    src: src.to_string(),
                });
            }
        }
    }
    images
}

fn extract_links(container: ElementRef<'_>) -> Vec<LinkRef> {
    container
        .select(&OUTBOUND_LINK)
        .filter_map(|anchor| {
            let url = decode_redirect_target(anchor.value().attr("href")?)?;
            let text = anchor
                .value()
                .attr("aria-label")
                .and_then(non_empty_text)
                .or_else(|| non_empty_text(&anchor.text().collect::<String>()));
            Some(LinkRef {
                url,
                thumbnail: anchor
                    .select(&IMG)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(str::to_string),
                domain: first_text(anchor, &LINK_DOMAIN),
                title: first_text(anchor, &LINK_TITLE),
                text,
            })
        })
        .collect()
}

/// Locate the "open video" anchor next to a video element in the content region.
fn extract_pending_video(container: ElementRef<'_>) -> Option<String> {
    let video = container.select(&VIDEO_ELEMENT).next()?;
    let sibling_scope = video.parent().and_then(ElementRef::wrap);
    sibling_scope
        .into_iter()
        .chain(std::iter::once(container))
        .flat_map(|scope| scope.select(&VIDEO_ANCHOR))
        .find_map(|anchor| normalize_video_url(anchor.value().attr("href")?))
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .find_map(|node| non_empty_text(&node.text().collect::<String>()))
}

/// Avatar URL from a `role="img"` node: `src`, inline background image, or
/// a nested SVG `image`.
fn avatar_source(node: ElementRef<'_>) -> Option<String> {
    let element = node.value();
    if let Some(src) = element.attr("src") {
        return Some(src.to_string());
    }
    if let Some(style) = element.attr("style")
        && let Some(captures) = CSS_URL_RE.captures(style)
    {
        return Some(css_unescape(&captures[1]));
    }
    node.select(&SVG_IMAGE).find_map(|image| {
        image
            .value()
            .attr("xlink:href")
            .or_else(|| image.value().attr("href"))
            .map(str::to_string)
    })
}

/// Decode CSS hex escapes (`\3a ` -> `:`) used in inline style URLs.
fn css_unescape(value: &str) -> String {
    CSS_ESCAPE_RE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_css_urls() {
        assert_eq!(
            css_unescape(r"https\3a //scontent.example/x.jpg?a\3d 1\26 b\3d 2"),
            "https://scontent.example/x.jpg?a=1&b=2"
        );
    }

    #[test]
    fn missing_container_is_an_error() {
        let err = extract_content("<html><body><p>hi</p></body></html>", "https://x").unwrap_err();
        assert!(matches!(err, ExtractionError::MissingContent { .. }));
    }
}
