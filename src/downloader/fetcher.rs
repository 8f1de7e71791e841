use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::DownloadSettings;
use crate::error::Result;

/// Fetches image URLs to disk over one pooled HTTP client.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(settings: &DownloadSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Downloads `url` into `path`.
    ///
    /// Returns `None` (after logging) on a non-success status, a network
    /// error, or a failed write; nothing is written in those cases.
    pub async fn download(&self, url: &str, path: &Path) -> Option<PathBuf> {
        match self.fetch_to(url, path).await {
            Ok(true) => {
                debug!(path = %path.display(), "Downloaded image");
                Some(path.to_path_buf())
            }
            Ok(false) => None,
            Err(e) => {
                warn!(url, "Error downloading image: {e}");
                None
            }
        }
    }

    async fn fetch_to(&self, url: &str, path: &Path) -> Result<bool> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Failed to download image");
            return Ok(false);
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(true)
    }
}
