//! Shared constants for postcrawl
//!
//! Platform hosts, DOM selectors, block-page markers and crawl defaults.
//! Selectors live here so layout drift can be handled in one place.

// =============================================================================
// Platform hosts
// =============================================================================

/// Registrable domain of the crawled platform.
pub const PLATFORM_DOMAIN: &str = "facebook.com";

/// Host used by every canonical permalink, independent of device prefix.
pub const CANONICAL_HOST: &str = "www.facebook.com";

/// Host used for mobile-profile navigation and video sub-pages.
pub const MOBILE_HOST: &str = "m.facebook.com";

/// Device host prefixes that all map onto the same content.
pub const DEVICE_HOST_PREFIXES: &[&str] = &["www", "m", "mobile", "mbasic", "web", "touch"];

/// Query parameters that identify a video sub-page; everything else is tracking.
pub const VIDEO_QUERY_WHITELIST: &[&str] = &["v", "id", "story_fbid"];

// =============================================================================
// Content extraction selectors
// =============================================================================

/// Primary content region of a post page.
pub const CONTENT_CONTAINER_SELECTOR: &str = ".story_body_container";

/// Header region preceding the content block (author name + avatar).
pub const HEADER_SELECTOR: &str = "header";

/// Avatar node inside the header.
pub const AVATAR_SELECTOR: &str = "[role=\"img\"]";

/// Paragraphs making up the post text.
pub const TEXT_SELECTOR: &str = "p";

/// Structured timestamp carriers. `data-store` holds JSON with a `time` key.
pub const TIMESTAMP_SELECTOR: &str = "abbr[data-store], [data-utime]";

/// Anchors that open an image in the lightbox viewer.
pub const LIGHTBOX_ANCHOR_SELECTOR: &str = "a[data-sigil~=\"photo-image\"], a[rel=\"theater\"]";

/// Candidate outbound link anchors (filtered further by `LINK_REDIRECT_PATTERN`).
pub const OUTBOUND_LINK_SELECTOR: &str = "a[href*=\"l.php\"]";

/// Title of an outbound link preview card.
pub const LINK_TITLE_SELECTOR: &str = "h3, ._52jh";

/// Domain label of an outbound link preview card.
pub const LINK_DOMAIN_SELECTOR: &str = ".domain, ._52jc";

/// Video element (or lazy inline-video placeholder) inside the content region.
pub const VIDEO_ELEMENT_SELECTOR: &str = "video, [data-sigil~=\"inlineVideo\"]";

/// "Open video" anchors pointing at the dedicated video sub-page.
pub const VIDEO_ANCHOR_SELECTOR: &str = "a[href*=\"/videos/\"], a[href*=\"/watch/\"]";

/// Image sources served from the platform's asset hosts.
pub const ASSET_HOST_PATTERN: &str = r"^https?://[^/]*(fbcdn\.net|scontent)";

/// Outbound redirect wrapper; the real destination sits in the `u` parameter.
pub const LINK_REDIRECT_PATTERN: &str = r"^https?://l[m]?\.facebook\.com/l\.php";

// =============================================================================
// Block detection markers
// =============================================================================

/// Path fragments that mean the request was redirected to an auth wall.
pub const LOGIN_URL_PATTERN: &str = r"(/login(\.php)?|/checkpoint)(/|\?|#|$)";

/// Anti-bot challenge markers.
pub const CAPTCHA_SELECTOR: &str =
    "#captcha, form[action*=\"captcha\"], iframe[src*=\"captcha\"], #captcha_response";

/// Both markers must be present on a well-formed mobile page.
pub const MOBILE_META_MARKERS: [&str; 2] = ["#viewport", "#objects_container"];

/// Title the platform serves on its generic internal-error page.
pub const ERROR_PAGE_TITLE: &str = "Error";

// =============================================================================
// Video sub-page
// =============================================================================

/// Cookie-consent accept control.
pub const COOKIE_CONSENT_SELECTOR: &str =
    "[data-cookiebanner=\"accept_button\"], button[data-testid=\"cookie-policy-manage-dialog-accept-button\"]";

/// Poster control that starts inline playback when clicked.
pub const VIDEO_POSTER_SELECTOR: &str = "[data-sigil*=\"inlineVideo\"]";

/// Playable element that appears after activation.
pub const VIDEO_PLAYABLE_SELECTOR: &str = "video[src]";

// =============================================================================
// Browser identity
// =============================================================================

/// Desktop Chrome user agent.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Mobile Chrome user agent (Android).
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.163 Mobile Safari/537.36";

/// Resources blocked before navigation: fonts, media and known tracking pixels.
pub const DEFAULT_BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.otf",
    "*.mp3",
    "*.m4a",
    "*/tr/?*",
    "*/tr?*",
    "*/ajax/bz*",
    "*/security/hsts-pixel*",
];

// =============================================================================
// Crawl defaults
// =============================================================================

/// Tag written into every dataset item.
pub const SCHEMA_VERSION: u32 = 1;

/// File holding the checkpointed aggregation store.
pub const STATE_FILE_NAME: &str = "crawl_state.json";

/// Newline-delimited JSON dataset written at the end of a run.
pub const DATASET_FILE_NAME: &str = "dataset.jsonl";

pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 5;
pub const MAX_CONCURRENT_PAGES_LIMIT: usize = 50;
pub const DEFAULT_MAX_REQUEST_RETRIES: u8 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MOBILE_MARKERS_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VIDEO_POSTER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VIDEO_SETTLE_DELAY_MS: u64 = 1500;
pub const DEFAULT_VIDEO_ELEMENT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_COOKIE_RETRY_INTERVAL_MS: u64 = 500;
pub const DEFAULT_COOKIE_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SESSION_MAX_USAGE: u32 = 50;
pub const DEFAULT_SESSION_MAX_ERRORS: u32 = 3;
