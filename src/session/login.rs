use tracing::{info, warn};

use super::PageDriver;
use crate::config::{BrowserSettings, Credentials};
use crate::error::{Result, ScrapeError};
use crate::models::SiteProfile;

/// Log in with the account credentials.
///
/// Returns `Ok(false)` when the logged-in marker never appears (bad
/// credentials, or a challenge that needs a human); a screenshot of the
/// page is saved for debugging. A missing login form is an error.
pub async fn login<D>(
    driver: &D,
    credentials: &Credentials,
    site: &SiteProfile,
    settings: &BrowserSettings,
) -> Result<bool>
where
    D: PageDriver + ?Sized,
{
    info!(url = %site.login_url, "Navigating to login page");
    driver.goto(&site.login_url).await?;
    driver
        .wait_for_selector(&site.email_input, settings.login_timeout)
        .await?;

    info!("Entering credentials");
    driver.fill(&site.email_input, &credentials.email).await?;
    driver.fill(&site.password_input, &credentials.password).await?;
    driver.click(&site.submit_button).await?;

    info!("Waiting for login confirmation");
    match driver
        .wait_for_selector(&site.logged_in_marker, settings.login_timeout)
        .await
    {
        Ok(()) => {
            info!("Login successful");
            Ok(true)
        }
        Err(ScrapeError::Timeout(_)) => {
            warn!("Login failed. Could be a CAPTCHA or wrong credentials");
            if let Err(e) = driver.screenshot(&settings.login_screenshot).await {
                warn!(path = %settings.login_screenshot.display(), "Failed to save login screenshot: {e}");
            }
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
