//! URL classification
//!
//! Maps a seed URL onto a request label, the author identity it aggregates
//! under, and a canonical permalink. Pure and deterministic: classifying a
//! canonical URL yields the same label and author as the URL it came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::utils::constants::CANONICAL_HOST;
use crate::utils::is_platform_host;

/// Kind of page a request points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestLabel {
    Post,
    Photo,
    Video,
}

impl RequestLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Photo => "PHOTO",
            Self::Video => "VIDEO",
        }
    }
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL the crawler knows how to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedUrl {
    pub label: RequestLabel,
    pub author_id: String,
    pub canonical_url: String,
    /// Input URL as given
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecognizedReason {
    InvalidUrl,
    ForeignHost,
    UnsupportedShape,
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidUrl => "not a valid http(s) URL",
            Self::ForeignHost => "host is not the platform domain",
            Self::UnsupportedShape => "path is not a post, photo or video permalink",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Recognized(ClassifiedUrl),
    Unrecognized {
        url: String,
        reason: UnrecognizedReason,
    },
}

impl Classification {
    #[must_use]
    pub fn recognized(self) -> Option<ClassifiedUrl> {
        match self {
            Self::Recognized(classified) => Some(classified),
            Self::Unrecognized { .. } => None,
        }
    }
}

/// Classify a URL into a label, author identity and canonical permalink.
#[must_use]
pub fn classify(input: &str) -> Classification {
    let unrecognized = |reason| Classification::Unrecognized {
        url: input.to_string(),
        reason,
    };

    let Ok(url) = Url::parse(input.trim()) else {
        return unrecognized(UnrecognizedReason::InvalidUrl);
    };
    if !matches!(url.scheme(), "http" | "https") {
        return unrecognized(UnrecognizedReason::InvalidUrl);
    }
    if !url.host_str().is_some_and(is_platform_host) {
        return unrecognized(UnrecognizedReason::ForeignHost);
    }

    match classify_path(&url) {
        Some((label, author_id, canonical_url)) => Classification::Recognized(ClassifiedUrl {
            label,
            author_id,
            canonical_url,
            url: input.to_string(),
        }),
        None => unrecognized(UnrecognizedReason::UnsupportedShape),
    }
}

fn classify_path(url: &Url) -> Option<(RequestLabel, String, String)> {
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();
    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    match segments.as_slice() {
        [author, "posts", post_id, ..] if is_identifier(author) => {
            Some(post(author, post_id))
        }
        ["story.php" | "permalink.php"] => {
            let post_id = query("story_fbid")?;
            let author = query("id")?;
            Some(post(&author, &post_id))
        }
        // Photos inside an album are hosted by a post with the photo's id
        [author, "photos", _album, photo_id, ..] if is_identifier(author) => {
            Some(post(author, photo_id))
        }
        ["photo.php"] => {
            let photo_id = query("fbid")?;
            let author = query("id")?;
            Some((
                RequestLabel::Photo,
                author.clone(),
                format!("https://{CANONICAL_HOST}/photo.php?fbid={photo_id}&id={author}"),
            ))
        }
        [author, "videos", video_id] | [author, "videos", _, video_id]
            if is_identifier(author) =>
        {
            Some((
                RequestLabel::Video,
                (*author).to_string(),
                format!("https://{CANONICAL_HOST}/{author}/videos/{video_id}"),
            ))
        }
        _ => None,
    }
}

fn post(author: &str, post_id: &str) -> (RequestLabel, String, String) {
    (
        RequestLabel::Post,
        author.to_string(),
        format!("https://{CANONICAL_HOST}/{author}/posts/{post_id}"),
    )
}

/// Page names and numeric ids; rules out endpoints such as `story.php`.
fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.ends_with(".php")
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}
