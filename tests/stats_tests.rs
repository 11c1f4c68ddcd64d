//! Counter extraction from inline scripts

use postcrawl::page_extractor::{extract_stats, max_from_matches};
use proptest::prelude::*;
use regex::Regex;

const URL: &str = "https://www.facebook.com/alice/posts/98765432101";

fn share_re() -> Regex {
    Regex::new(r#""share_count":\{"count":(\d+)"#).unwrap()
}

proptest! {
    #[test]
    fn max_from_matches_takes_the_largest(counts in prop::collection::vec(0u64..1_000_000_000, 0..12)) {
        let text: String = counts
            .iter()
            .map(|n| format!(r#"{{"share_count":{{"count":{n}}},"noise":"x"}}"#))
            .collect::<Vec<_>>()
            .join(",");
        let expected = counts.iter().copied().max().unwrap_or(0);
        prop_assert_eq!(max_from_matches(&share_re(), &text), expected);
    }

    #[test]
    fn counts_never_come_from_unrelated_scripts(n in 1u64..100_000) {
        let unrelated = format!(r#"{{"url":"https://www.facebook.com/bob/posts/9","share_count":{{"count":{n}}}}}"#);
        let stats = extract_stats(&[unrelated], URL);
        prop_assert_eq!(stats.shares, 0);
    }
}

#[test]
fn test_no_matches_is_zero() {
    assert_eq!(max_from_matches(&share_re(), ""), 0);
    assert_eq!(max_from_matches(&share_re(), r#""share_count":{"count":"many"}"#), 0);
}

#[test]
fn test_maximum_across_scripts() {
    let scripts = vec![
        format!(r#"{{"u":"{URL}","reaction_count":{{"count":10}},"comment_count":{{"total_count":1}}}}"#),
        format!(r#"{{"u":"{URL}","reaction_count":{{"count":25}},"share_count":{{"count":4}}}}"#),
    ];
    let stats = extract_stats(&scripts, URL);
    assert_eq!(stats.reactions, 25);
    assert_eq!(stats.comments, 1);
    assert_eq!(stats.shares, 4);
    assert!(stats.reaction_types.is_empty());
}
