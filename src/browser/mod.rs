//! Browser driver: page abstraction, Chromium launch and device presets.

pub mod page;
pub mod profile;
pub mod setup;

pub use page::{BrowserPage, ChromiumPage};
pub use profile::{DeviceProfile, Viewport};
pub use setup::{LaunchOptions, LaunchedBrowser, ProfileDir, launch_browser};
