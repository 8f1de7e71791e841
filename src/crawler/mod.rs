//! The scroll-and-collect loop.
//!
//! `INIT -> NAVIGATED -> SCROLLING* -> DONE | STALLED`: navigate to the
//! destination, let it settle, then scroll and re-extract until the target
//! count is reached or too many scrolls in a row add nothing.

use serde::Serialize;
use tracing::{debug, info};

pub mod datascraper;
use datascraper::PinExtractor;

use crate::config::ScrollPolicy;
use crate::error::Result;
use crate::models::{Pin, PinCollection, ScrapeRequest, SiteProfile};
use crate::session::PageDriver;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The target count was reached.
    Done,
    /// Scrolling stopped surfacing new pins.
    Stalled,
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// At most `target` pins, in the order they were first seen.
    pub pins: Vec<Pin>,
    pub termination: Termination,
    pub scrolls: usize,
}

pub struct Crawler<'a, D: ?Sized> {
    driver: &'a D,
    site: &'a SiteProfile,
    policy: &'a ScrollPolicy,
    extractor: PinExtractor,
}

impl<'a, D> Crawler<'a, D>
where
    D: PageDriver + ?Sized,
{
    pub fn new(driver: &'a D, site: &'a SiteProfile, policy: &'a ScrollPolicy) -> Result<Self> {
        Ok(Self {
            driver,
            site,
            policy,
            extractor: PinExtractor::new(site)?,
        })
    }

    pub async fn crawl(&self, request: &ScrapeRequest) -> Result<CrawlReport> {
        let url = self.site.destination(request.mode, &request.query)?;

        info!(url = %url, mode = %request.mode, "Navigating to search destination");
        self.driver.goto(&url).await?;
        tokio::time::sleep(self.policy.settle_delay).await;

        let mut pins = PinCollection::with_limit(request.target);
        let mut last_count = 0;
        let mut stale_scrolls = 0;
        let mut scrolls = 0;
        let mut termination = Termination::Done;

        while !pins.is_full() {
            debug!(collected = pins.len(), target = request.target, "Scrolling for more pins");

            self.driver.scroll_to_bottom().await?;
            tokio::time::sleep(self.policy.scroll_delay).await;
            scrolls += 1;

            let html = self.driver.content().await?;
            for pin in self.extractor.extract(&html) {
                pins.insert(pin);
                if pins.is_full() {
                    break;
                }
            }

            if pins.len() == last_count {
                stale_scrolls += 1;
                if stale_scrolls > self.policy.max_stale_scrolls {
                    info!(collected = pins.len(), scrolls, "No more new pins found. Ending scrape");
                    termination = Termination::Stalled;
                    break;
                }
            } else {
                last_count = pins.len();
                stale_scrolls = 0;
            }
        }

        info!(collected = pins.len(), target = request.target, scrolls, "Scrape finished");

        Ok(CrawlReport {
            pins: pins.into_vec(),
            termination,
            scrolls,
        })
    }
}
