//! One browser session from launch to teardown: load the query, walk the
//! result pages, and always close the browser.

pub mod paginator;


pub use paginator::Paginator;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{BrowserSession, ChromiumSession, LaunchOptions};
use crate::config::{Config, SelectorConfig};
use crate::error::{Result, SearchError};
use crate::parser::{PageExtractor, ResultCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Launching,
    Loaded,
    Paginating,
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Launching => "launching",
            SessionState::Loaded => "loaded",
            SessionState::Paginating => "paginating",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Fixed for the lifetime of one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub driver_path: Option<PathBuf>,
    pub headless: bool,
    pub extra_args: Vec<String>,
    pub page_budget: u32,
    pub provider_url: String,
    pub load_timeout: Duration,
    pub poll_interval: Duration,
    pub screenshot_path: PathBuf,
    pub selectors: SelectorConfig,
    paginator: Paginator,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            driver_path: config.browser.driver_path.clone(),
            headless: config.browser.headless,
            extra_args: config.browser.extra_args.clone(),
            page_budget: config.search.page_budget.max(1),
            provider_url: config.search.provider_url.clone(),
            load_timeout: config.search.load_timeout,
            poll_interval: config.search.poll_interval,
            screenshot_path: config.screenshot_path(),
            selectors: config.selectors.clone(),
            paginator: Paginator::new(&config.selectors, &config.search),
        }
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            executable: self.driver_path.clone(),
            headless: self.headless,
            extra_args: self.extra_args.clone(),
        }
    }

    /// `<provider_url>?q=<query>`, form-encoded so spaces become `+`.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        Ok(Url::parse_with_params(&self.provider_url, &[("q", query)])?)
    }
}

/// A failed fetch together with whatever was collected before the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FetchFailure {
    pub error: SearchError,
    pub partial: ResultCollection,
}

pub struct SearchSession<B: BrowserSession> {
    browser: B,
    config: SessionConfig,
    extractor: PageExtractor,
    state: SessionState,
    pages_extracted: u32,
}

impl SearchSession<ChromiumSession> {
    /// Start Chromium and wrap it in a session. Launch failures are fatal.
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        Self::launch_with(config, |options| async move { ChromiumSession::launch(&options).await }).await
    }
}

impl<B: BrowserSession> SearchSession<B> {
    /// Acquire a browser through `launcher` and wrap it in a session.
    ///
    /// The selectors are checked before anything is launched. A launcher
    /// error is returned as is and leaves nothing behind to close.
    pub async fn launch_with<F, Fut>(config: SessionConfig, launcher: F) -> Result<Self>
    where
        F: FnOnce(LaunchOptions) -> Fut,
        Fut: Future<Output = Result<B>>,
    {
        let extractor = PageExtractor::new(&config.selectors)?;
        log_transition(SessionState::Idle, SessionState::Launching);

        match launcher(config.launch_options()).await {
            Ok(browser) => Ok(Self {
                browser,
                config,
                extractor,
                state: SessionState::Launching,
                pages_extracted: 0,
            }),
            Err(e) => {
                log_transition(SessionState::Launching, SessionState::Failed);
                Err(e)
            }
        }
    }

    /// Wrap a browser that is already running.
    pub async fn with_browser(browser: B, config: SessionConfig) -> Result<Self> {
        Self::launch_with(config, |_| async move { Ok(browser) }).await
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pages_extracted(&self) -> u32 {
        self.pages_extracted
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log_transition(self.state, next);
            self.state = next;
        }
    }

    /// Run the search and return every record collected, even on failure.
    ///
    /// A failed fetch is logged; non-fatal failures also trigger a
    /// best-effort screenshot. The browser is closed exactly once before
    /// this returns.
    pub async fn run(mut self, query: &str) -> ResultCollection {
        let results = match self.fetch(query).await {
            Ok(results) => results,
            Err(failure) => {
                error!(
                    "Search failed after {} page(s): {}",
                    self.pages_extracted, failure.error
                );
                // fatal faults happen before the page is touched
                if !failure.error.is_fatal() {
                    self.capture_screenshot().await;
                }
                failure.partial
            }
        };

        self.teardown().await;
        results
    }

    /// Navigate to the query and walk up to `page_budget` pages.
    pub async fn fetch(&mut self, query: &str) -> std::result::Result<ResultCollection, FetchFailure> {
        let mut results = ResultCollection::new();

        if let Err(error) = self.load(query).await {
            self.transition(SessionState::Failed);
            return Err(FetchFailure { error, partial: results });
        }

        let budget = self.config.page_budget;
        for page in 1..=budget {
            self.transition(SessionState::Paginating);

            let records = match self.extractor.extract(&mut self.browser).await {
                Ok(records) => records,
                Err(error) => {
                    self.transition(SessionState::Failed);
                    return Err(FetchFailure { error, partial: results });
                }
            };
            self.pages_extracted += 1;
            info!("Page {}/{}: {} results", page, budget, records.len());
            results.extend_page(records);

            // the last budgeted page never needs the next-page control
            if page == budget {
                break;
            }

            match self.config.paginator.advance(&mut self.browser).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    self.transition(SessionState::Failed);
                    return Err(FetchFailure { error, partial: results });
                }
            }
        }

        self.transition(SessionState::Done);
        info!("Collected {} results", results.len());
        Ok(results)
    }

    async fn load(&mut self, query: &str) -> Result<()> {
        let url = self.config.search_url(query)?;
        self.browser.navigate(url.as_str()).await?;

        let load_timeout = self.config.load_timeout;
        self.browser
            .wait_until_visible(&self.config.selectors.result, load_timeout, self.config.poll_interval)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::NavigationTimeout(load_timeout)
                } else {
                    e
                }
            })?;

        self.transition(SessionState::Loaded);
        Ok(())
    }

    async fn capture_screenshot(&mut self) {
        let path = self.config.screenshot_path.clone();
        match self.browser.screenshot(&path).await {
            Ok(()) => warn!("Saved diagnostic screenshot to {}", path.display()),
            Err(e) => error!("Could not capture diagnostic screenshot: {}", e),
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.browser.close().await {
            error!("Failed to close browser session: {}", e);
        }
    }
}

fn log_transition(from: SessionState, to: SessionState) {
    debug!("Session state: {} -> {}", from, to);
}
