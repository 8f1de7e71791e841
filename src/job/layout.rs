use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::downloader::METADATA_FILE;
use crate::error::Result;

const MAX_NAME_CHARS: usize = 50;

/// Per-job output directory: `<data>/<query>_<timestamp>/{images/, data.csv}`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl OutputLayout {
    /// Create a fresh, uniquely named job directory under `data_dir`.
    pub fn create(data_dir: &Path, query: &str, now: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let base = format!(
            "{}_{}",
            sanitize_query(query),
            now.format("%Y%m%d_%H%M%S")
        );

        let mut root = data_dir.join(&base);
        let mut attempt = 1;
        loop {
            match fs::create_dir(&root) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    root = data_dir.join(format!("{base}_{attempt}"));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let images_dir = root.join("images");
        fs::create_dir(&images_dir)?;

        info!(path = %root.display(), "Created job directory");

        Ok(Self {
            metadata_path: root.join(METADATA_FILE),
            images_dir,
            root,
        })
    }

    /// Delete the job directory and everything in it.
    pub fn remove(&self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => info!(path = %self.root.display(), "Removed job directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.root.display(), "Failed to remove job directory: {e}"),
        }
    }
}

/// Non-alphanumerics become `_`, capped at 50 characters.
pub fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(MAX_NAME_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 5, 7).unwrap()
    }

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("modern kitchen!"), "modern_kitchen_");
        assert_eq!(
            sanitize_query("https://www.pinterest.com/a/b/"),
            "https___www_pinterest_com_a_b_"
        );
        assert_eq!(sanitize_query(&"x".repeat(80)).len(), 50);
        assert_eq!(sanitize_query("café"), "café");
    }

    #[test]
    fn test_create_layout() {
        let data = tempfile::tempdir().unwrap();
        let layout = OutputLayout::create(data.path(), "red cars", noon()).unwrap();

        assert_eq!(layout.root, data.path().join("red_cars_20240309_120507"));
        assert!(layout.images_dir.is_dir());
        assert_eq!(layout.metadata_path, layout.root.join("data.csv"));
    }

    #[test]
    fn test_same_second_gets_unique_directory() {
        let data = tempfile::tempdir().unwrap();
        let first = OutputLayout::create(data.path(), "cars", noon()).unwrap();
        let second = OutputLayout::create(data.path(), "cars", noon()).unwrap();

        assert_ne!(first.root, second.root);
        assert_eq!(second.root, data.path().join("cars_20240309_120507_2"));
    }

    #[test]
    fn test_remove_deletes_partial_output() {
        let data = tempfile::tempdir().unwrap();
        let layout = OutputLayout::create(data.path(), "cars", noon()).unwrap();
        std::fs::write(layout.images_dir.join("pin_1.jpg"), b"partial").unwrap();

        layout.remove();
        assert!(!layout.root.exists());
        // Removing twice is harmless.
        layout.remove();
    }
}
