use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("No search results became visible within {0:?}")]
    NavigationTimeout(Duration),

    #[error("Pagination stopped: {0}")]
    PaginationTimeout(String),

    #[error("Timed out after {timeout:?} waiting for {what}")]
    WaitTimeout { what: String, timeout: Duration },

    #[error("Unknown dork '{0}'")]
    UnknownDork(String),

    #[error("Cannot export an empty result set as CSV")]
    EmptyExport,

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What the caller should do when a given error surfaces.
#[derive(Debug, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Abort the invocation before (or instead of) touching the browser.
    Abort,
    /// Keep whatever was collected, capture a screenshot, tear down.
    DegradeToPartial,
    /// Treat as a normal end of results.
    EndOfResults,
    /// Log and carry on with the next entry.
    LogAndContinue,
}

impl SearchError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            SearchError::Launch(_) | SearchError::UnknownDork(_) | SearchError::Config(_) => {
                RecoveryStrategy::Abort
            }
            SearchError::NavigationTimeout(_) | SearchError::Browser(_) => {
                RecoveryStrategy::DegradeToPartial
            }
            SearchError::PaginationTimeout(_) | SearchError::WaitTimeout { .. } => {
                RecoveryStrategy::EndOfResults
            }
            SearchError::Parse(_) => RecoveryStrategy::LogAndContinue,
            SearchError::EmptyExport | SearchError::Storage(_) => RecoveryStrategy::Abort,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SearchError::NavigationTimeout(_)
                | SearchError::PaginationTimeout(_)
                | SearchError::WaitTimeout { .. }
        )
    }

    pub fn is_fatal(&self) -> bool {
        self.recovery_strategy() == RecoveryStrategy::Abort
    }
}

// Conversion implementations for common error types
impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for SearchError {
    fn from(err: toml::de::Error) -> Self {
        SearchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SearchError {
    fn from(err: toml::ser::Error) -> Self {
        SearchError::Config(err.to_string())
    }
}

impl From<url::ParseError> for SearchError {
    fn from(err: url::ParseError) -> Self {
        SearchError::Config(format!("invalid provider url: {}", err))
    }
}

impl From<chromiumoxide::error::CdpError> for SearchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SearchError::Browser(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_classified() {
        assert!(SearchError::NavigationTimeout(Duration::from_secs(10)).is_timeout());
        assert!(SearchError::PaginationTimeout("gone".to_string()).is_timeout());
        assert!(SearchError::WaitTimeout {
            what: "#more-results".to_string(),
            timeout: Duration::from_secs(1),
        }
        .is_timeout());
        assert!(!SearchError::Browser("crashed".to_string()).is_timeout());
    }

    #[test]
    fn test_configuration_faults_are_fatal() {
        assert!(SearchError::UnknownDork("nope".to_string()).is_fatal());
        assert!(SearchError::Launch("no chrome".to_string()).is_fatal());
        assert!(SearchError::Config("bad".to_string()).is_fatal());
        assert!(!SearchError::NavigationTimeout(Duration::from_secs(10)).is_fatal());
        assert_eq!(
            SearchError::PaginationTimeout("done".to_string()).recovery_strategy(),
            RecoveryStrategy::EndOfResults
        );
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: SearchError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(matches!(err, SearchError::Storage(ref msg) if msg.contains("disk full")));
    }
}
