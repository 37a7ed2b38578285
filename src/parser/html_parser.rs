use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::config::SelectorConfig;
use crate::error::{RecoveryStrategy, Result, SearchError};
use crate::parser::ResultRecord;

/// Reads the result entries visible on the current page.
pub struct PageExtractor {
    result_selector: String,
    title_link_selector: Selector,
    snippet_selector: Selector,
}

impl PageExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            result_selector: selectors.result.clone(),
            title_link_selector: Selector::parse(&selectors.title_link)
                .map_err(|e| SearchError::Config(format!("Invalid title selector: {}", e)))?,
            snippet_selector: Selector::parse(&selectors.snippet)
                .map_err(|e| SearchError::Config(format!("Invalid snippet selector: {}", e)))?,
        })
    }

    /// Extract every result container on the page.
    ///
    /// Containers missing a title link or snippet are skipped with a warning
    /// instead of failing the whole page.
    pub async fn extract<B: BrowserSession + ?Sized>(&self, browser: &mut B) -> Result<Vec<ResultRecord>> {
        let containers = browser.find_all(&self.result_selector).await?;
        let total = containers.len();

        let mut records = Vec::with_capacity(total);
        for (index, container) in containers.iter().enumerate() {
            match self.parse_entry(&container.html) {
                Ok(record) => records.push(record),
                Err(e) if e.recovery_strategy() == RecoveryStrategy::LogAndContinue => {
                    warn!("Skipping result #{}: {}", index + 1, e);
                }
                Err(e) => return Err(e),
            }
        }

        info!("Extracted {} of {} result entries", records.len(), total);
        Ok(records)
    }

    /// Parse one result container's outer HTML.
    pub fn parse_entry(&self, html: &str) -> Result<ResultRecord> {
        let fragment = Html::parse_fragment(html);

        let title_link = fragment
            .select(&self.title_link_selector)
            .next()
            .ok_or_else(|| SearchError::Parse("result has no title link".to_string()))?;

        let link = title_link
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| SearchError::Parse("title link has no href".to_string()))?;

        let snippet = fragment
            .select(&self.snippet_selector)
            .next()
            .ok_or_else(|| SearchError::Parse("result has no snippet".to_string()))?;

        let record = ResultRecord::new(visible_text(&title_link), link, visible_text(&snippet));
        debug!("Parsed result: {}", record.link());
        Ok(record)
    }
}

// rendered-ish text: all descendant text with whitespace runs collapsed
fn visible_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
