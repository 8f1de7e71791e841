use std::collections::HashSet;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScrapeError};

/// A single pin: its detail page and the image it shows.
///
/// Identity is the pair itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pin {
    #[serde(rename = "pin_url")]
    pub detail_url: String,
    pub image_url: String,
}

impl Pin {
    pub fn new(detail_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            detail_url: detail_url.into(),
            image_url: image_url.into(),
        }
    }
}

/// Unique pins, capped at a maximum size, kept in the order they were first seen.
#[derive(Debug, Clone)]
pub struct PinCollection {
    limit: usize,
    order: Vec<Pin>,
    seen: HashSet<Pin>,
}

impl PinCollection {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Adds a pin; returns false when it is a duplicate or the collection is full.
    pub fn insert(&mut self, pin: Pin) -> bool {
        if self.is_full() || self.seen.contains(&pin) {
            return false;
        }
        self.seen.insert(pin.clone());
        self.order.push(pin);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.limit
    }

    pub fn into_vec(self) -> Vec<Pin> {
        self.order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// The query is a search keyword.
    Keyword,
    /// The query is the destination URL itself.
    Url,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Keyword => write!(f, "keyword"),
            SearchMode::Url => write!(f, "url"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub mode: SearchMode,
    pub query: String,
    pub target: usize,
}

impl ScrapeRequest {
    pub fn new(mode: SearchMode, query: impl Into<String>, target: usize) -> Self {
        Self {
            mode,
            query: query.into(),
            target,
        }
    }
}

/// The target site's URLs and DOM contract.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub base_url: String,
    pub login_url: String,
    pub search_url: String,
    pub email_input: String,
    pub password_input: String,
    pub submit_button: String,
    /// Only present once a login has gone through.
    pub logged_in_marker: String,
    pub pin_container: String,
    pub detail_prefix: String,
    pub low_res_marker: String,
    pub high_res_marker: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.pinterest.com".to_string(),
            login_url: "https://www.pinterest.com/login/".to_string(),
            search_url: "https://www.pinterest.com/search/pins/".to_string(),
            email_input: r#"input[name="id"]"#.to_string(),
            password_input: r#"input[name="password"]"#.to_string(),
            submit_button: r#"button[type="submit"]"#.to_string(),
            logged_in_marker: r#"input[aria-label="Search"]"#.to_string(),
            pin_container: r#"div[data-grid-item="true"]"#.to_string(),
            detail_prefix: "/pin/".to_string(),
            low_res_marker: "/236x/".to_string(),
            high_res_marker: "/736x/".to_string(),
        }
    }
}

impl SiteProfile {
    /// Where to navigate for a request: the search page for keywords, the query verbatim otherwise.
    pub fn destination(&self, mode: SearchMode, query: &str) -> Result<String> {
        match mode {
            SearchMode::Keyword => {
                let url = Url::parse_with_params(&self.search_url, &[("q", query)])?;
                Ok(url.to_string())
            }
            SearchMode::Url => {
                if query.trim().is_empty() {
                    return Err(ScrapeError::InvalidRequest("empty URL".to_string()));
                }
                Ok(query.to_string())
            }
        }
    }

    pub fn detail_url(&self, href: &str) -> String {
        format!("{}{}", self.base_url, href)
    }

    /// Swap the thumbnail path segment for the larger one; untouched if the marker is absent.
    pub fn upgrade_image_url(&self, src: &str) -> String {
        src.replace(&self.low_res_marker, &self.high_res_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_rejects_duplicates() {
        let mut pins = PinCollection::with_limit(10);
        assert!(pins.insert(Pin::new("https://a/pin/1/", "https://i/1.jpg")));
        assert!(!pins.insert(Pin::new("https://a/pin/1/", "https://i/1.jpg")));
        // Same detail page with a different image is a distinct pin.
        assert!(pins.insert(Pin::new("https://a/pin/1/", "https://i/2.jpg")));
        assert_eq!(pins.len(), 2);
    }

    #[test]
    fn test_collection_never_exceeds_limit() {
        let mut pins = PinCollection::with_limit(3);
        for i in 0..10 {
            pins.insert(Pin::new(format!("https://a/pin/{i}/"), format!("https://i/{i}.jpg")));
        }
        assert!(pins.is_full());
        let pins = pins.into_vec();
        assert_eq!(pins.len(), 3);
        assert_eq!(pins[0].detail_url, "https://a/pin/0/");
        assert_eq!(pins[2].detail_url, "https://a/pin/2/");
    }

    #[test]
    fn test_keyword_destination_is_form_encoded() {
        let site = SiteProfile::default();
        let url = site
            .destination(SearchMode::Keyword, "modern kitchen & bath")
            .unwrap();
        assert_eq!(
            url,
            "https://www.pinterest.com/search/pins/?q=modern+kitchen+%26+bath"
        );
    }

    #[test]
    fn test_url_destination_is_verbatim() {
        let site = SiteProfile::default();
        let board = "https://www.pinterest.com/someone/kitchens/";
        assert_eq!(site.destination(SearchMode::Url, board).unwrap(), board);
        assert!(site.destination(SearchMode::Url, "   ").is_err());
    }

    #[test]
    fn test_upgrade_image_url() {
        let site = SiteProfile::default();
        assert_eq!(
            site.upgrade_image_url("https://i.pinimg.com/236x/ab/cd/ef.jpg"),
            "https://i.pinimg.com/736x/ab/cd/ef.jpg"
        );
        assert_eq!(
            site.upgrade_image_url("https://i.pinimg.com/originals/ab/cd/ef.jpg"),
            "https://i.pinimg.com/originals/ab/cd/ef.jpg"
        );
    }

    #[test]
    fn test_detail_url_prefixes_origin() {
        let site = SiteProfile::default();
        assert_eq!(site.detail_url("/pin/42/"), "https://www.pinterest.com/pin/42/");
    }
}
