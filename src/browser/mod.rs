pub mod chromium;


pub use chromium::{ChromiumSession, LaunchOptions};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SearchError};

pub type ElementId = Uuid;

/// A DOM element found on the current page.
///
/// `html` is the element's outer HTML at the time it was found; `id` lets the
/// session act on the live node again (click it, probe it for staleness).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: ElementId,
    pub html: String,
}

impl ElementHandle {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            html: html.into(),
        }
    }
}

/// The browser capabilities a search needs.
///
/// The provided `wait_*` methods poll the primitive probes until a deadline,
/// so an implementation only has to answer "what is there right now".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Every element currently matching `selector`, in document order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn is_visible(&mut self, element: &ElementHandle) -> Result<bool>;

    /// Whether the element is still part of the current document.
    async fn is_attached(&mut self, element: &ElementHandle) -> Result<bool>;

    async fn click(&mut self, element: &ElementHandle) -> Result<()>;

    async fn screenshot(&mut self, path: &Path) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    /// First visible element matching `selector`, or `WaitTimeout`.
    ///
    /// A failed lookup or probe counts as "not visible yet"; the page may be
    /// mid re-render, so polling continues until the deadline.
    async fn wait_until_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            let candidates = match self.find_all(selector).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    debug!("Lookup of '{}' failed, retrying: {}", selector, e);
                    Vec::new()
                }
            };
            for element in candidates {
                match self.is_visible(&element).await {
                    Ok(true) => return Ok(element),
                    Ok(false) => {}
                    Err(e) => debug!("Visibility probe for {} failed, retrying: {}", element.id, e),
                }
            }
            if Instant::now() >= deadline {
                return Err(SearchError::WaitTimeout {
                    what: format!("visible '{}'", selector),
                    timeout,
                });
            }
            sleep(poll_interval).await;
        }
    }

    /// Block until `element` has left the document, or `WaitTimeout`.
    async fn wait_until_stale(
        &mut self,
        element: &ElementHandle,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_attached(element).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SearchError::WaitTimeout {
                    what: format!("element {} to go stale", element.id),
                    timeout,
                });
            }
            sleep(poll_interval).await;
        }
    }
}
