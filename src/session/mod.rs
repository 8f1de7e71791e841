//! Browser session: the page capability the scraper drives, the
//! chromiumoxide-backed implementation, and the login flow.
//!
//! Everything that touches the page goes through [`PageDriver`]. A single
//! page is never driven from more than one task at a time.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub mod browser;
#[cfg(test)]
pub mod fake;
pub mod login;

pub use browser::Session;
pub use login::login;

/// Operations the scraper needs from an automated browser page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for the page to finish loading.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` exists, or fail with `ScrapeError::Timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current serialized DOM of the page.
    async fn content(&self) -> Result<String>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Release the page and the browser behind it. Safe to call more than once.
    async fn close(&self);
}
