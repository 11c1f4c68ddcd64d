//! Stats pass: engagement counters from inline page scripts

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::schema::PostStats;

static COMMENT_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"comment_count"\s*:\s*\{\s*"total_count"\s*:\s*(\d+)"#)
        .expect("Invalid comment count regex")
});
static REACTION_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"reaction_count"\s*:\s*\{\s*"count"\s*:\s*(\d+)"#)
        .expect("Invalid reaction count regex")
});
static SHARE_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"share_count"\s*:\s*\{\s*"count"\s*:\s*(\d+)"#)
        .expect("Invalid share count regex")
});
static POST_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/posts/([^/?#]+)|[?&](?:story_fbid|fbid)=(\d+)").expect("Invalid post id regex")
});

/// Literal start of the reaction breakdown fragment
pub const REACTIONS_START_MARKER: &str = r#""top_reactions":{"edges":"#;
/// Literal end of the reaction breakdown fragment
pub const REACTIONS_END_MARKER: &str = "]}";

#[derive(Debug, Deserialize)]
struct ReactionEdge {
    node: ReactionNode,
    reaction_count: u64,
}

#[derive(Debug, Deserialize)]
struct ReactionNode {
    reaction_type: String,
}

/// Maximum of the first capture group across all matches; 0 when nothing matches.
#[must_use]
pub fn max_from_matches(pattern: &Regex, text: &str) -> u64 {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Whether a script belongs to the post at `canonical_url`.
///
/// Matches the raw URL, its JSON-escaped form, or the bare post id as a whole
/// token.
#[must_use]
pub fn mentions_post(script: &str, canonical_url: &str) -> bool {
    if script.contains(canonical_url) || script.contains(&canonical_url.replace('/', r"\/")) {
        return true;
    }
    post_id(canonical_url).is_some_and(|id| contains_token(script, id))
}

/// `needle` occurs with no alphanumeric character on either side.
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

fn post_id(canonical_url: &str) -> Option<&str> {
    let caps = POST_ID_RE.captures(canonical_url)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Parse the reaction breakdown bounded by the literal markers.
///
/// Strict: any malformed fragment yields an empty map.
#[must_use]
pub fn parse_reaction_breakdown(script: &str) -> BTreeMap<String, u64> {
    let Some(start) = script.find(REACTIONS_START_MARKER) else {
        return BTreeMap::new();
    };
    let fragment_start = start + REACTIONS_START_MARKER.len();
    let Some(end) = script[fragment_start..].find(REACTIONS_END_MARKER) else {
        return BTreeMap::new();
    };
    // Keep the closing bracket of the edge array
    let fragment = &script[fragment_start..fragment_start + end + 1];

    match serde_json::from_str::<Vec<ReactionEdge>>(fragment) {
        Ok(edges) => {
            let mut types = BTreeMap::new();
            for edge in edges {
                let slot = types
                    .entry(edge.node.reaction_type.to_lowercase())
                    .or_insert(0);
                *slot = (*slot).max(edge.reaction_count);
            }
            types
        }
        Err(e) => {
            debug!("Unparseable reaction breakdown: {}", e);
            BTreeMap::new()
        }
    }
}

/// Compute post stats from the page's inline script texts.
#[must_use]
pub fn extract_stats(scripts: &[String], canonical_url: &str) -> PostStats {
    let relevant: Vec<&str> = scripts
        .iter()
        .map(String::as_str)
        .filter(|script| mentions_post(script, canonical_url))
        .collect();

    let mut stats = PostStats::default();
    for script in relevant {
        stats.comments = stats.comments.max(max_from_matches(&COMMENT_COUNT_RE, script));
        stats.reactions = stats.reactions.max(max_from_matches(&REACTION_COUNT_RE, script));
        stats.shares = stats.shares.max(max_from_matches(&SHARE_COUNT_RE, script));
        if stats.reaction_types.is_empty() {
            stats.reaction_types = parse_reaction_breakdown(script);
        }
    }
    stats
}
