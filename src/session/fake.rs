//! In-memory page used by the tests: serves scripted HTML snapshots and
//! records every action it is asked to perform.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::PageDriver;
use crate::error::{Result, ScrapeError};

#[derive(Default)]
struct State {
    selectors: HashSet<String>,
    snapshots: Vec<String>,
    actions: Mutex<Vec<String>>,
    content_calls: AtomicUsize,
    fail_content: bool,
    closed: AtomicBool,
}

#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut State {
        Arc::get_mut(&mut self.state).expect("configure FakePage before cloning it")
    }

    /// Make `selector` resolve immediately.
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.state_mut().selectors.insert(selector.to_string());
        self
    }

    /// Successive `content()` calls walk these snapshots, repeating the last one.
    pub fn with_snapshots(mut self, snapshots: Vec<String>) -> Self {
        self.state_mut().snapshots = snapshots;
        self
    }

    pub fn failing_content(mut self) -> Self {
        self.state_mut().fail_content = true;
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.actions.lock().unwrap().clone()
    }

    pub fn content_calls(&self) -> usize {
        self.state.content_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn record(&self, action: String) {
        self.state.actions.lock().unwrap().push(action);
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {url}"));
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("wait {selector}"));
        if self.state.selectors.contains(selector) {
            Ok(())
        } else {
            Err(ScrapeError::Timeout(format!("selector {selector}")))
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.record(format!("fill {selector} {value}"));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click {selector}"));
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.record("scroll".to_string());
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let call = self.state.content_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_content {
            return Err(ScrapeError::Browser("page crashed".to_string()));
        }
        let snapshots = &self.state.snapshots;
        Ok(snapshots
            .get(call)
            .or_else(|| snapshots.last())
            .cloned()
            .unwrap_or_default())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(format!("screenshot {}", path.display()));
        Ok(())
    }

    async fn close(&self) {
        self.record("close".to_string());
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

/// HTML for a results page holding one grid item per `(href, src)` pair.
pub fn grid_html(items: &[(String, String)]) -> String {
    let mut html = String::from("<html><body><div class=\"grid\">");
    for (href, src) in items {
        html.push_str(&format!(
            r#"<div data-grid-item="true"><a href="{href}"><img src="{src}"></a></div>"#
        ));
    }
    html.push_str("</div></body></html>");
    html
}

/// `count` distinct pins starting at `start`, served from `image_base`.
pub fn pin_items(start: usize, count: usize, image_base: &str) -> Vec<(String, String)> {
    (start..start + count)
        .map(|i| (format!("/pin/{i}/"), format!("{image_base}/236x/ok{i}.jpg")))
        .collect()
}
