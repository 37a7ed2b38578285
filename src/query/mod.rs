//! Turns the user's raw query, target domain and optional dork into the
//! single string submitted to the search provider.

pub mod dork;

pub use dork::{Dork, DEFAULT_DOMAIN};

use tracing::debug;

use crate::error::Result;

/// Resolve the final query string.
///
/// A dork wins over the raw query; otherwise a non-empty domain scopes the
/// raw query with `site:`. Callers keep `raw_query` and `dork` mutually
/// exclusive.
pub fn build(raw_query: Option<&str>, domain: Option<&str>, dork: Option<Dork>) -> Result<String> {
    let domain = domain.map(str::trim).unwrap_or("");
    let raw_query = raw_query.unwrap_or("");

    let query = match dork {
        Some(dork) => dork.render(domain),
        None if !domain.is_empty() => format!("site:{} {}", domain, raw_query),
        None => raw_query.to_string(),
    };

    debug!("Resolved query: {}", query);
    Ok(query)
}

/// Like [`build`], but takes the dork by its command-line key.
pub fn build_from_key(raw_query: Option<&str>, domain: Option<&str>, dork_key: Option<&str>) -> Result<String> {
    let dork = dork_key.map(str::parse::<Dork>).transpose()?;
    build(raw_query, domain, dork)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    #[test]
    fn test_dork_with_domain() {
        assert_eq!(
            build(None, Some("cia.gov"), Some(Dork::DirListing)).unwrap(),
            "site:cia.gov intitle:index.of"
        );
    }

    #[test]
    fn test_domain_scoped_query() {
        assert_eq!(
            build(Some("secrets"), Some("example.org"), None).unwrap(),
            "site:example.org secrets"
        );
    }

    #[test]
    fn test_empty_domain_returns_query_verbatim() {
        assert_eq!(build(Some("foo"), Some(""), None).unwrap(), "foo");
        assert_eq!(build(Some("foo bar"), None, None).unwrap(), "foo bar");
    }

    #[test]
    fn test_dork_without_domain_uses_default() {
        assert_eq!(
            build(None, None, Some(Dork::FindSubdomains)).unwrap(),
            "site:*.*.example.com"
        );
    }

    #[test]
    fn test_build_is_pure() {
        for dork in Dork::ALL {
            let first = build(None, Some("cia.gov"), Some(dork)).unwrap();
            let second = build(None, Some("cia.gov"), Some(dork)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_build_from_key() {
        assert_eq!(
            build_from_key(None, Some("cia.gov"), Some("log_files")).unwrap(),
            "site:cia.gov ext:log"
        );
        let err = build_from_key(None, Some("cia.gov"), Some("nope")).unwrap_err();
        assert!(matches!(err, SearchError::UnknownDork(_)));
    }
}
