//! Post page extraction.
//!
//! Content and stats passes over a loaded post page, plus the video
//! sub-page subflow.

pub mod content;
pub mod js_scripts;
pub mod page_data;
pub mod schema;
pub mod stats;
pub mod video;

pub use content::{ExtractionError, extract_content};
pub use page_data::extract_post;
pub use schema::{ImageRef, LinkRef, PostRecord, PostStats, VideoRef};
pub use stats::{extract_stats, max_from_matches};
pub use video::{AbsentReason, VideoOutcome, VideoTimings, acquire_video};
