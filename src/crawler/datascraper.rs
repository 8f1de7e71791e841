use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::error::{Result, ScrapeError};
use crate::models::{Pin, SiteProfile};

static LINK_SELECTOR: OnceLock<Selector> = OnceLock::new();
static IMAGE_SELECTOR: OnceLock<Selector> = OnceLock::new();

/// Pulls pins out of a results page snapshot.
#[derive(Debug, Clone)]
pub struct PinExtractor {
    site: SiteProfile,
    container: Selector,
}

impl PinExtractor {
    pub fn new(site: &SiteProfile) -> Result<Self> {
        let container = Selector::parse(&site.pin_container).map_err(|e| ScrapeError::Selector {
            selector: site.pin_container.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            site: site.clone(),
            container,
        })
    }

    /// Every pin on the page, in document order. Duplicates are left to the caller.
    pub fn extract(&self, html: &str) -> Vec<Pin> {
        let document = Html::parse_document(html);
        document
            .select(&self.container)
            .filter_map(|element| self.extract_one(element))
            .collect()
    }

    fn extract_one(&self, element: ElementRef<'_>) -> Option<Pin> {
        let link = element.select(link_selector()).next()?;
        let href = link.value().attr("href")?;
        if !href.starts_with(&self.site.detail_prefix) {
            return None;
        }

        let image = element.select(image_selector()).next()?;
        let src = image.value().attr("src").filter(|s| !s.is_empty())?;

        Some(Pin::new(
            self.site.detail_url(href),
            self.site.upgrade_image_url(src),
        ))
    }
}

fn link_selector() -> &'static Selector {
    LINK_SELECTOR.get_or_init(|| Selector::parse("a").unwrap())
}

fn image_selector() -> &'static Selector {
    IMAGE_SELECTOR.get_or_init(|| Selector::parse("img").unwrap())
}
