//! JavaScript evaluated in the page
//!
//! Scripts are kept minimal: they hand raw page data back to Rust, and all
//! parsing and filtering happens on the Rust side.

/// Collect the text of every inline (non-`src`) script element.
pub const INLINE_SCRIPTS_SCRIPT: &str = r"
    (() => Array.from(document.querySelectorAll('script:not([src])'))
        .map(script => script.textContent || '')
        .filter(text => text.length > 0))()
";

/// Element function: resolved playable source of a `video` element.
pub const VIDEO_SOURCE_FN: &str = r"el => el.currentSrc || el.src || null";

/// Element function: whether the element is currently rendered.
pub const VISIBILITY_FN: &str =
    r"el => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)";

/// Build a script that runs `function` against the first match of `selector`,
/// returning `null` when nothing matches.
///
/// The selector is embedded as a JSON string literal so quotes in attribute
/// selectors cannot break out of the script.
#[must_use]
pub fn query_selector_eval_script(selector: &str, function: &str) -> String {
    let selector_literal =
        serde_json::to_string(selector).unwrap_or_else(|_| String::from("\"\""));
    format!(
        r"(() => {{
            const el = document.querySelector({selector_literal});
            if (!el) return null;
            return ({function})(el);
        }})()"
    )
}
