//! Data model for extracted posts.
//!
//! Every optional field follows the fill-if-null rule when two observations of
//! the same entity meet: a set value is never overwritten, a null value is
//! filled by whichever observation carries one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Image attached to a post, opened through the lightbox anchor that wraps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Enclosing lightbox anchor href
    pub link: String,
    /// Image source URL
    pub src: String,
}

/// Outbound link, keyed by its decoded destination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRef {
    pub url: String,
    pub thumbnail: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
}

impl LinkRef {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Fill every null optional field from `other`; set fields are kept.
    pub fn merge_from(&mut self, other: LinkRef) {
        fill_if_null(&mut self.thumbnail, other.thumbnail);
        fill_if_null(&mut self.domain, other.domain);
        fill_if_null(&mut self.title, other.title);
        fill_if_null(&mut self.text, other.text);
    }
}

/// Video sub-page and the playable source recovered from it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub post_url: String,
    pub url: Option<String>,
}

/// Engagement counters read from the page's inline scripts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub reactions: u64,
    pub shares: u64,
    pub comments: u64,
    /// Lowercase reaction type -> count
    #[serde(default)]
    pub reaction_types: BTreeMap<String, u64>,
}

impl PostStats {
    /// Per-field maximum, including every reaction type.
    pub fn merge_from(&mut self, other: PostStats) {
        self.reactions = self.reactions.max(other.reactions);
        self.shares = self.shares.max(other.shares);
        self.comments = self.comments.max(other.comments);
        for (kind, count) in other.reaction_types {
            let slot = self.reaction_types.entry(kind).or_insert(0);
            *slot = (*slot).max(count);
        }
    }
}

/// One aggregated post per author identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub post_url: Option<String>,
    pub post_date: Option<String>,
    pub post_text: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub links: Vec<LinkRef>,
    #[serde(default)]
    pub videos: Vec<VideoRef>,
    #[serde(default)]
    pub stats: PostStats,
    /// Discovered video sub-page that has not been resolved yet
    pub pending_video_url: Option<String>,
}

impl PostRecord {
    /// Append an image unless it is already recorded.
    pub fn push_image(&mut self, image: ImageRef) {
        if !self.images.contains(&image) {
            self.images.push(image);
        }
    }

    /// Insert a link, merging into an existing entry with the same destination.
    pub fn push_link(&mut self, link: LinkRef) {
        match self.links.iter_mut().find(|existing| existing.url == link.url) {
            Some(existing) => existing.merge_from(link),
            None => self.links.push(link),
        }
    }

    /// Record the outcome of a video sub-page.
    ///
    /// Clears `pending_video_url`. A post carries at most one video: the new
    /// reference replaces the current one unless it failed to resolve while the
    /// current one succeeded, so the last successful resolution is kept.
    pub fn resolve_video(&mut self, video: VideoRef) {
        self.pending_video_url = None;
        let keep_current = self
            .videos
            .first()
            .is_some_and(|current| current.url.is_some() && video.url.is_none());
        if !keep_current {
            self.videos = vec![video];
        }
    }

    /// Merge another observation of the same author into this record.
    ///
    /// Scalars are fill-if-null, collections are unioned by key and stats
    /// counters take the per-field maximum.
    pub fn merge_from(&mut self, other: PostRecord) {
        fill_if_null(&mut self.author_name, other.author_name);
        fill_if_null(&mut self.author_avatar, other.author_avatar);
        fill_if_null(&mut self.post_url, other.post_url);
        fill_if_null(&mut self.post_date, other.post_date);
        fill_if_null(&mut self.post_text, other.post_text);
        fill_if_null(&mut self.pending_video_url, other.pending_video_url);

        for image in other.images {
            self.push_image(image);
        }
        for link in other.links {
            self.push_link(link);
        }
        for video in other.videos {
            match self.videos.iter_mut().find(|v| v.post_url == video.post_url) {
                Some(existing) => fill_if_null(&mut existing.url, video.url),
                None => self.videos.push(video),
            }
        }
        self.stats.merge_from(other.stats);
    }

    /// Fold a freshly extracted post into the author's existing record.
    ///
    /// Same rules as `merge_from`, except the post's pending video is dropped
    /// once the record already holds a video, so a resolved sub-page is never
    /// scheduled again.
    pub fn absorb_post(&mut self, mut post: PostRecord) {
        if !self.videos.is_empty() {
            post.pending_video_url = None;
        }
        self.merge_from(post);
    }

    /// Whether nothing further is expected for this record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending_video_url.is_none()
    }
}

fn fill_if_null<T>(slot: &mut Option<T>, candidate: Option<T>) {
    if slot.is_none() {
        *slot = candidate;
    }
}
