use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::PageDriver;
use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One browser process and the single page a job drives.
///
/// [`PageDriver::close`] shuts both down; if a session is dropped without
/// being closed, chromiumoxide kills the child process.
pub struct Session {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: Mutex<Option<JoinHandle<()>>>,
    navigation_timeout: Duration,
}

impl Session {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_size.0, settings.window_size.1)
            .request_timeout(settings.navigation_timeout)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage");
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page creation error: {close_err}");
                }
                handler.abort();
                return Err(e.into());
            }
        };

        info!(headless = settings.headless, "Browser session started");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler: Mutex::new(Some(handler)),
            navigation_timeout: settings.navigation_timeout,
        })
    }
}

#[async_trait]
impl PageDriver for Session {
    async fn goto(&self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ScrapeError::Timeout(format!("navigation to {url}"))),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(ScrapeError::Timeout(format!("selector {selector}")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn close(&self) {
        let mut browser_guard = self.browser.lock().await;
        let Some(mut browser) = browser_guard.take() else {
            return;
        };

        if let Err(e) = self.page.clone().close().await {
            debug!("Page close error: {e}");
        }
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {e}");
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        info!("Browser session closed");
    }
}
