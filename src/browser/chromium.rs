use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::{BrowserSession, ElementHandle, ElementId};
use crate::error::{Result, SearchError};

const VISIBILITY_PROBE: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && Number(style.opacity) !== 0
        && rect.width > 0
        && rect.height > 0;
}"#;

const ATTACHED_PROBE: &str = "function() { return this.isConnected; }";

/// Live elements behind the handles given out by `find_all`.
///
/// Each lookup replaces the previous handles for the same selector, so
/// repeated polling does not grow the registry.
struct ElementRegistry<E> {
    entries: HashMap<ElementId, (String, E)>,
}

impl<E> ElementRegistry<E> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn forget_selector(&mut self, selector: &str) {
        self.entries.retain(|_, (owner, _)| owner != selector);
    }

    fn insert(&mut self, selector: &str, id: ElementId, element: E) {
        self.entries.insert(id, (selector.to_string(), element));
    }

    fn get(&self, id: &ElementId) -> Option<&E> {
        self.entries.get(id).map(|(_, element)| element)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// chromiumoxide needs the browser itself, not a WebDriver server.
fn looks_like_chromedriver(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().contains("chromedriver"))
        .unwrap_or(false)
}

/// How to start the browser process.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Chrome/Chromium binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub extra_args: Vec<String>,
}

/// A single Chromium process with one page, driven over CDP.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    elements: ElementRegistry<Element>,
    user_data_dir: PathBuf,
    closed: bool,
}

impl ChromiumSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, executable: {})",
            options.headless,
            options
                .executable
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detect".to_string())
        );

        if let Some(ref executable) = options.executable {
            if looks_like_chromedriver(executable) {
                warn!(
                    "{} looks like a chromedriver binary; point --driver or CHROME_PATH at Chrome/Chromium instead",
                    executable.display()
                );
            }
            if !executable.is_file() {
                return Err(SearchError::Launch(format!(
                    "browser executable not found at {}",
                    executable.display()
                )));
            }
        }

        // unique profile dir so a stale singleton lock never blocks startup
        let user_data_dir = std::env::temp_dir().join(format!(
            "duck-dorker-{}-{}",
            std::process::id(),
            Uuid::new_v4()
        ));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .args(vec![
                "--disable-gpu",
                "--disable-dev-shm-usage",
                "--disable-extensions",
                "--mute-audio",
                "--no-first-run",
                "--disable-default-apps",
                "--disable-sync",
                "--disable-blink-features=AutomationControlled", // hide automation
            ])
            .args(options.extra_args.iter().cloned());

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = options.executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|e| SearchError::Launch(format!("Failed to create browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SearchError::Launch(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // filter out common websocket deserialization errors
                    let message = e.to_string();
                    if message.contains("data did not match any variant")
                        || message.contains("untagged enum Message")
                    {
                        debug!("Ignoring CDP deserialization error: {}", e);
                    } else {
                        warn!("Browser handler error: {}", e);
                    }
                }
            }
            debug!("Browser handler task ended");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    error!("Failed to close browser after page error: {}", close_err);
                }
                handler_task.abort();
                return Err(SearchError::Launch(format!("Failed to open a page: {}", e)));
            }
        };

        info!("Browser launched");
        Ok(Self {
            browser,
            page,
            handler_task,
            elements: ElementRegistry::new(),
            user_data_dir,
            closed: false,
        })
    }

    fn element(&self, element: &ElementHandle) -> Option<&Element> {
        self.elements.get(&element.id)
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.elements.clear();
        self.page
            .goto(url)
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.elements.forget_selector(selector);
        let found = self.page.find_elements(selector).await?;
        let mut handles = Vec::with_capacity(found.len());

        for element in found {
            let html = element.outer_html().await?.unwrap_or_default();
            let handle = ElementHandle::new(html);
            self.elements.insert(selector, handle.id, element);
            handles.push(handle);
        }

        debug!(
            "Selector '{}' matched {} elements ({} tracked)",
            selector,
            handles.len(),
            self.elements.len()
        );
        Ok(handles)
    }

    async fn is_visible(&mut self, element: &ElementHandle) -> Result<bool> {
        let Some(live) = self.element(element) else {
            return Ok(false);
        };
        let returns = live.call_js_fn(VISIBILITY_PROBE, false).await?;
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn is_attached(&mut self, element: &ElementHandle) -> Result<bool> {
        let Some(live) = self.element(element) else {
            return Ok(false);
        };
        // a destroyed execution context means the node went away with its document
        match live.call_js_fn(ATTACHED_PROBE, false).await {
            Ok(returns) => Ok(returns
                .result
                .value
                .as_ref()
                .and_then(|v| v.as_bool())
                .unwrap_or(false)),
            Err(e) => {
                debug!("Element {} no longer reachable: {}", element.id, e);
                Ok(false)
            }
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        let live = self.element(element).ok_or_else(|| {
            SearchError::Browser(format!("Unknown element handle {}", element.id))
        })?;
        live.click()
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to click element: {}", e)))?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map_err(|e| SearchError::Browser(format!("Failed to save screenshot: {}", e)))?;
        info!("Saved screenshot to {}", path.display());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements.clear();

        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Failed waiting for browser process to exit: {}", e);
        }
        self.handler_task.abort();
        let _ = std::fs::remove_dir_all(&self.user_data_dir);

        result.map_err(|e| SearchError::Browser(format!("Failed to close browser: {}", e)))?;
        info!("Closed browser session");
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close, killing the process");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_replaces_handles_per_selector() {
        let mut registry = ElementRegistry::new();
        let button = Uuid::new_v4();
        registry.insert("#more-results", button, "button");

        for round in 0..5 {
            registry.forget_selector("article");
            for _ in 0..3 {
                registry.insert("article", Uuid::new_v4(), "result");
            }
            assert_eq!(registry.len(), 4, "round {}", round);
        }

        // a lookup for another selector keeps the button probe-able
        assert_eq!(registry.get(&button), Some(&"button"));
        registry.forget_selector("#more-results");
        assert!(registry.get(&button).is_none());
    }

    #[test]
    fn test_chromedriver_paths_are_recognised() {
        assert!(looks_like_chromedriver(Path::new("/usr/bin/chromedriver")));
        assert!(looks_like_chromedriver(Path::new("C:\\tools\\ChromeDriver.exe")));
        assert!(!looks_like_chromedriver(Path::new("/usr/bin/chromium")));
        assert!(!looks_like_chromedriver(Path::new("/opt/google/chrome/chrome")));
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_launch_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let options = LaunchOptions {
            executable: Some(temp_dir.path().join("chrome-missing")),
            ..LaunchOptions::default()
        };

        let err = ChromiumSession::launch(&options).await.err().unwrap();

        assert!(matches!(err, SearchError::Launch(ref msg) if msg.contains("chrome-missing")));
    }
}
