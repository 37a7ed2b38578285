use std::time::Duration;
use tracing::{debug, info};

use crate::browser::BrowserSession;
use crate::config::{SearchSettings, SelectorConfig};
use crate::error::{RecoveryStrategy, Result, SearchError};

/// Advances the results page through the provider's "more results" control.
#[derive(Debug, Clone)]
pub struct Paginator {
    more_results_selector: String,
    result_selector: String,
    timeout: Duration,
    poll_interval: Duration,
    rewait_results: bool,
}

impl Paginator {
    pub fn new(selectors: &SelectorConfig, search: &SearchSettings) -> Self {
        Self {
            more_results_selector: selectors.more_results.clone(),
            result_selector: selectors.result.clone(),
            timeout: search.pagination_timeout,
            poll_interval: search.poll_interval,
            rewait_results: search.rewait_results,
        }
    }

    /// Try to load the next page of results.
    ///
    /// Returns `Ok(false)` when there is no next page: the control never
    /// became clickable, or the page did not move on after the click.
    /// Any other browser fault is returned as an error.
    pub async fn advance<B: BrowserSession + ?Sized>(&self, browser: &mut B) -> Result<bool> {
        match self.try_advance(browser).await {
            Ok(()) => {
                info!("Advanced to the next page of results");
                Ok(true)
            }
            Err(e) if e.recovery_strategy() == RecoveryStrategy::EndOfResults => {
                info!("No further pages: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_advance<B: BrowserSession + ?Sized>(&self, browser: &mut B) -> Result<()> {
        let button = browser
            .wait_until_visible(&self.more_results_selector, self.timeout, self.poll_interval)
            .await
            .map_err(|e| pagination_timeout(e, "more results control not available"))?;

        debug!("Clicking more results control {}", button.id);
        browser.click(&button).await?;

        browser
            .wait_until_stale(&button, self.timeout, self.poll_interval)
            .await
            .map_err(|e| pagination_timeout(e, "page did not change after click"))?;

        if self.rewait_results {
            browser
                .wait_until_visible(&self.result_selector, self.timeout, self.poll_interval)
                .await
                .map_err(|e| pagination_timeout(e, "no results visible after click"))?;
        }

        Ok(())
    }
}

fn pagination_timeout(err: SearchError, reason: &str) -> SearchError {
    if err.is_timeout() {
        SearchError::PaginationTimeout(reason.to_string())
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{ElementHandle, MockBrowserSession};
    use mockall::Sequence;

    fn paginator() -> Paginator {
        Paginator::new(&SelectorConfig::default(), &SearchSettings::default())
    }

    fn timeout_error() -> SearchError {
        SearchError::WaitTimeout {
            what: "test".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn test_advance_clicks_and_waits_for_staleness() {
        let button = ElementHandle::new("<button id=\"more-results\"></button>");
        let button_id = button.id;
        let mut seq = Sequence::new();
        let mut browser = MockBrowserSession::new();

        let found = button.clone();
        browser
            .expect_wait_until_visible()
            .withf(|selector, _, _| selector == "#more-results")
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _| Ok(found.clone()));
        browser
            .expect_click()
            .withf(move |element| element.id == button_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        browser
            .expect_wait_until_stale()
            .withf(move |element, _, _| element.id == button_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        browser
            .expect_wait_until_visible()
            .withf(|selector, _, _| selector == r#"article[data-testid="result"]"#)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(ElementHandle::new("<article></article>")));

        assert!(paginator().advance(&mut browser).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_control_means_no_more_pages() {
        let mut browser = MockBrowserSession::new();
        browser
            .expect_wait_until_visible()
            .times(1)
            .returning(|_, _, _| Err(timeout_error()));
        browser.expect_click().never();

        assert!(!paginator().advance(&mut browser).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_timeout_means_no_more_pages() {
        let mut browser = MockBrowserSession::new();
        browser
            .expect_wait_until_visible()
            .times(1)
            .returning(|_, _, _| Ok(ElementHandle::new("<button></button>")));
        browser.expect_click().times(1).returning(|_| Ok(()));
        browser
            .expect_wait_until_stale()
            .times(1)
            .returning(|_, _, _| Err(timeout_error()));

        assert!(!paginator().advance(&mut browser).await.unwrap());
    }

    #[tokio::test]
    async fn test_click_failure_propagates() {
        let mut browser = MockBrowserSession::new();
        browser
            .expect_wait_until_visible()
            .times(1)
            .returning(|_, _, _| Ok(ElementHandle::new("<button></button>")));
        browser
            .expect_click()
            .times(1)
            .returning(|_| Err(SearchError::Browser("target closed".to_string())));

        let err = paginator().advance(&mut browser).await.unwrap_err();
        assert!(matches!(err, SearchError::Browser(_)));
    }

    #[tokio::test]
    async fn test_rewait_can_be_disabled() {
        let search = SearchSettings {
            rewait_results: false,
            ..SearchSettings::default()
        };
        let paginator = Paginator::new(&SelectorConfig::default(), &search);
        let expected_timeout = search.pagination_timeout;
        let expected_poll = search.poll_interval;

        let mut browser = MockBrowserSession::new();
        browser
            .expect_wait_until_visible()
            .withf(move |selector, timeout, poll| {
                selector == "#more-results" && *timeout == expected_timeout && *poll == expected_poll
            })
            .times(1)
            .returning(|_, _, _| Ok(ElementHandle::new("<button></button>")));
        browser.expect_click().times(1).returning(|_| Ok(()));
        browser
            .expect_wait_until_stale()
            .times(1)
            .returning(|_, _, _| Ok(()));

        assert!(paginator.advance(&mut browser).await.unwrap());
    }
}
