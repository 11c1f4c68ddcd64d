pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, non_empty_text, safe_truncate_chars};
pub use url_utils::{
    decode_redirect_target, is_platform_host, is_valid_url, normalize_video_url, resolve_href,
    to_mobile_url,
};
