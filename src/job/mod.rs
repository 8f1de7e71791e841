//! One scrape job end to end: output directory, browser session, login,
//! scroll-and-collect, downloads, summary.
//!
//! A job never returns an error to its caller. Every way it can end is a
//! [`JobOutcome`] whose `Display` is the status line to show the user.
//! Anything short of completion removes the job directory.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info};

pub mod layout;
pub mod progress;

use layout::OutputLayout;
pub use progress::{Progress, ProgressReporter, Stage};

use crate::config::Config;
use crate::crawler::{Crawler, Termination};
use crate::downloader::{Downloader, ImageFetcher};
use crate::error::Result;
use crate::models::{Pin, ScrapeRequest, SiteProfile};
use crate::session::{login, PageDriver, Session};

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub output_dir: PathBuf,
    pub metadata_path: PathBuf,
    /// Metadata rows, in file order.
    pub pins: Vec<Pin>,
    /// Image files that were actually written.
    pub image_files: Vec<PathBuf>,
    /// Image URLs whose download failed; their rows are still in the metadata file.
    pub failed_downloads: Vec<String>,
    pub termination: Termination,
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed(JobSummary),
    /// The request was refused before any work started.
    Rejected(String),
    LoginFailed,
    NoPins,
    Failed(String),
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Completed(summary) => write!(
                f,
                "Scraping complete! Data saved in '{}' folder.",
                summary.output_dir.display()
            ),
            JobOutcome::Rejected(reason) => write!(f, "{reason}"),
            JobOutcome::LoginFailed => write!(
                f,
                "Login Failed. Check credentials or solve CAPTCHA in non-headless mode."
            ),
            JobOutcome::NoPins => write!(
                f,
                "No pins found. The page might be empty or a different layout."
            ),
            JobOutcome::Failed(message) => write!(f, "An error occurred: {message}"),
        }
    }
}

pub struct JobRunner {
    config: Config,
    site: SiteProfile,
    downloader: Downloader,
}

impl JobRunner {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = ImageFetcher::new(&config.download)?;
        let downloader = Downloader::new(fetcher, config.download.concurrency);
        Ok(Self {
            config,
            site: SiteProfile::default(),
            downloader,
        })
    }

    /// Run a job against a freshly launched browser.
    pub async fn run(&self, request: &ScrapeRequest, progress: &ProgressReporter) -> JobOutcome {
        self.run_with(request, progress, || Session::launch(&self.config.browser))
            .await
    }

    /// Run a job against whatever page `launch` produces. The page is closed on every path.
    pub async fn run_with<S, L, F>(
        &self,
        request: &ScrapeRequest,
        progress: &ProgressReporter,
        launch: L,
    ) -> JobOutcome
    where
        S: PageDriver,
        L: FnOnce() -> F,
        F: Future<Output = Result<S>>,
    {
        if request.query.trim().is_empty() {
            return JobOutcome::Rejected("Error: Query/URL cannot be empty.".to_string());
        }
        if request.target == 0 {
            return JobOutcome::Rejected("Error: Number of pins must be at least 1.".to_string());
        }

        progress.report(Stage::Initializing, "Initializing scraper...");

        let layout = match OutputLayout::create(&self.config.data_dir, &request.query, Local::now()) {
            Ok(layout) => layout,
            Err(e) => {
                error!("Failed to create job directory: {e}");
                return JobOutcome::Failed(e.to_string());
            }
        };

        let result = match launch().await {
            Ok(session) => {
                let result = self.drive(&session, request, &layout, progress).await;
                session.close().await;
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome @ JobOutcome::Completed(_)) => outcome,
            Ok(outcome) => {
                layout.remove();
                outcome
            }
            Err(e) => {
                error!(query = %request.query, "Scrape job failed: {e}");
                layout.remove();
                JobOutcome::Failed(e.to_string())
            }
        }
    }

    async fn drive<D>(
        &self,
        driver: &D,
        request: &ScrapeRequest,
        layout: &OutputLayout,
        progress: &ProgressReporter,
    ) -> Result<JobOutcome>
    where
        D: PageDriver + ?Sized,
    {
        progress.report(Stage::LoggingIn, "Logging into Pinterest...");
        let logged_in = login(
            driver,
            &self.config.credentials,
            &self.site,
            &self.config.browser,
        )
        .await?;
        if !logged_in {
            return Ok(JobOutcome::LoginFailed);
        }

        progress.report(
            Stage::Scraping,
            format!("Starting to scrape for '{}'...", request.query),
        );
        let crawl = Crawler::new(driver, &self.site, &self.config.scroll)?
            .crawl(request)
            .await?;
        info!(
            pins = crawl.pins.len(),
            scrolls = crawl.scrolls,
            termination = ?crawl.termination,
            "Collection finished"
        );
        if crawl.pins.is_empty() {
            return Ok(JobOutcome::NoPins);
        }

        progress.report(
            Stage::Downloading,
            format!("Found {} pins. Downloading images...", crawl.pins.len()),
        );
        let downloads = self
            .downloader
            .download_pins(&crawl.pins, &layout.images_dir, &layout.metadata_path)
            .await?;

        let summary = JobSummary {
            output_dir: layout.root.clone(),
            metadata_path: downloads.metadata_path,
            pins: crawl.pins,
            image_files: downloads.saved,
            failed_downloads: downloads.failed,
            termination: crawl.termination,
        };
        let outcome = JobOutcome::Completed(summary);
        progress.report(Stage::Complete, outcome.to_string());
        Ok(outcome)
    }
}
