//! Device profiles
//!
//! Viewport and user-agent presets for the two device classes the crawl
//! navigates as. Applied per tab by `crawl_engine::page_enhancer`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::constants::{DESKTOP_USER_AGENT, MOBILE_USER_AGENT};

/// Device class a request is navigated as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    #[default]
    Mobile,
    Desktop,
}

impl DeviceProfile {
    #[must_use]
    pub fn user_agent(self) -> &'static str {
        match self {
            Self::Mobile => MOBILE_USER_AGENT,
            Self::Desktop => DESKTOP_USER_AGENT,
        }
    }

    #[must_use]
    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mobile => f.write_str("mobile"),
            Self::Desktop => f.write_str("desktop"),
        }
    }
}

/// Emulated screen metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: i64,
    pub height: i64,
    pub device_scale_factor: f64,
    pub mobile: bool,
}

impl Viewport {
    /// Mid-range Android phone
    #[must_use]
    pub fn mobile_preset() -> Self {
        Self {
            width: 412,
            height: 915,
            device_scale_factor: 2.625,
            mobile: true,
        }
    }

    #[must_use]
    pub fn desktop_preset() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
            mobile: false,
        }
    }
}
