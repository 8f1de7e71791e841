//! Download stage: fetch every pin's image with bounded concurrency, then
//! write the metadata table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::WriterBuilder;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub mod fetcher;
pub use fetcher::ImageFetcher;

use crate::error::Result;
use crate::models::Pin;

pub const METADATA_FILE: &str = "data.csv";
pub const DEFAULT_EXTENSION: &str = ".jpg";

#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub metadata_path: PathBuf,
    /// Image files actually written, in pin order.
    pub saved: Vec<PathBuf>,
    /// Image URLs that could not be fetched. Their metadata rows are still written.
    pub failed: Vec<String>,
}

pub struct Downloader {
    fetcher: ImageFetcher,
    concurrency: usize,
}

impl Downloader {
    pub fn new(fetcher: ImageFetcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every image into `images_dir`, then write one metadata row per pin to `metadata_path`.
    ///
    /// Individual fetch failures are logged and skipped.
    pub async fn download_pins(
        &self,
        pins: &[Pin],
        images_dir: &Path,
        metadata_path: &Path,
    ) -> Result<DownloadReport> {
        tokio::fs::create_dir_all(images_dir).await?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        info!(count = pins.len(), concurrency = self.concurrency, "Downloading images");

        for (i, pin) in pins.iter().enumerate() {
            let index = i + 1;
            let path = images_dir.join(image_file_name(index, &pin.image_url));
            let url = pin.image_url.clone();
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();

            join_set.spawn(async move {
                let saved = match semaphore.acquire_owned().await {
                    Ok(_permit) => fetcher.download(&url, &path).await,
                    Err(_) => None,
                };
                (index, url, saved)
            });
        }

        let mut saved = Vec::with_capacity(pins.len());
        let mut failed = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, _, Some(path))) => saved.push((index, path)),
                Ok((_, url, None)) => failed.push(url),
                Err(e) => warn!("Download task failed: {e}"),
            }
        }
        saved.sort_by_key(|(index, _)| *index);

        write_metadata(metadata_path, pins)?;
        info!(
            saved = saved.len(),
            failed = failed.len(),
            path = %metadata_path.display(),
            "Saved metadata"
        );

        Ok(DownloadReport {
            metadata_path: metadata_path.to_path_buf(),
            saved: saved.into_iter().map(|(_, path)| path).collect(),
            failed,
        })
    }
}

/// `pin_<index>` plus the URL's file extension, ignoring any query string.
pub fn image_file_name(index: usize, image_url: &str) -> String {
    let path = image_url
        .split(['?', '#'])
        .next()
        .unwrap_or(image_url);
    let name = path.rsplit('/').next().unwrap_or(path);

    // Leading dots belong to the stem, as in ".hidden".
    let stem_start = name.len() - name.trim_start_matches('.').len();
    let extension = match name.rfind('.') {
        Some(pos) if pos > stem_start && pos + 1 < name.len() => &name[pos..],
        _ => DEFAULT_EXTENSION,
    };

    format!("pin_{index}{extension}")
}

/// Write the `pin_url,image_url` table, one row per pin in the given order.
pub fn write_metadata(path: &Path, pins: &[Pin]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["pin_url", "image_url"])?;
    for pin in pins {
        writer.serialize(pin)?;
    }
    writer.flush()?;
    Ok(())
}
