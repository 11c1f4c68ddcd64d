//! Per-tab preparation before navigation
//!
//! Device emulation, user agent, asset blocking and cookie resets, all sent
//! as CDP commands on the tab.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, EnableParams, SetBlockedUrLsParams, SetUserAgentOverrideParams,
};

use crate::browser::{DeviceProfile, Viewport};

/// Emulate `device` on the tab and block `blocked_patterns`.
pub async fn enhance_page(
    page: &Page,
    device: DeviceProfile,
    viewport: Viewport,
    blocked_patterns: &[String],
) -> Result<()> {
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width)
            .height(viewport.height)
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.mobile)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await
    .context("Failed to set device metrics")?;

    page.execute(SetUserAgentOverrideParams::new(device.user_agent()))
        .await
        .context("Failed to override user agent")?;

    if !blocked_patterns.is_empty() {
        page.execute(EnableParams::default())
            .await
            .context("Failed to enable network domain")?;
        page.execute(SetBlockedUrLsParams::new(blocked_patterns.to_vec()))
            .await
            .context("Failed to set blocked URLs")?;
    }

    log::debug!("Tab prepared as {} ({}x{})", device, viewport.width, viewport.height);
    Ok(())
}

/// Drop every cookie in the browser, handing the next request a fresh identity.
pub async fn clear_cookies(page: &Page) -> Result<()> {
    page.execute(ClearBrowserCookiesParams::default())
        .await
        .context("Failed to clear browser cookies")?;
    Ok(())
}
