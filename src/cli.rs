//! Command line surface: argument parsing, config overrides and query resolution.

use clap::builder::PossibleValue;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::query::{self, Dork};
use crate::storage::ExportFormat;

/// Search DuckDuckGo from the command line using advanced search techniques.
#[derive(Parser, Debug)]
#[command(name = "duck-dorker", version, about)]
pub struct Cli {
    /// Search query to execute (not with --dorks)
    #[arg(long, conflicts_with = "dorks")]
    pub query: Option<String>,

    /// Predefined dork search to run
    #[arg(long, value_enum)]
    pub dorks: Option<Dork>,

    /// Domain to focus the search on, e.g. "cia.gov"
    #[arg(long, default_value = "")]
    pub domain: String,

    /// Maximum number of pages to fetch
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: Option<u32>,

    /// Run the browser in headless mode
    #[arg(long)]
    pub headless: bool,

    /// Path to the Chrome/Chromium executable (not chromedriver)
    #[arg(long, env = "CHROME_PATH")]
    pub driver: Option<PathBuf>,

    /// Export format for the results
    #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
    pub export: ExportFormat,

    /// TOML configuration file (created with defaults if missing)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for results.json, results.csv and error screenshots
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print the available dorks and exit
    #[arg(long)]
    pub list_dorks: bool,
}

impl ValueEnum for Dork {
    fn value_variants<'a>() -> &'a [Self] {
        &Dork::ALL
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.key()).help(self.description()))
    }
}

impl Cli {
    /// Checks clap cannot express: a search target is needed unless listing dorks.
    pub fn validate(&self) -> std::result::Result<(), clap::Error> {
        if !self.list_dorks && self.query.is_none() && self.dorks.is_none() {
            let mut command = Cli::command();
            return Err(command.error(
                ErrorKind::MissingRequiredArgument,
                "one of --query or --dorks is required",
            ));
        }
        Ok(())
    }

    /// Command line flags win over the configuration file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(pages) = self.pages {
            config.search.page_budget = pages;
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(driver) = self.driver.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            config.browser.driver_path = Some(driver.clone());
        }
        if let Some(ref output_dir) = self.output_dir {
            config.output.directory = output_dir.clone();
        }
    }

    pub fn resolve_query(&self) -> Result<String> {
        query::build(self.query.as_deref(), Some(&self.domain), self.dorks)
    }
}

/// Dork keys and descriptions as a bordered table.
pub fn dork_table() -> String {
    let key_width = Dork::ALL.iter().map(|d| d.key().len()).max().unwrap_or(0).max("Dork".len());
    let desc_width = Dork::ALL
        .iter()
        .map(|d| d.description().len())
        .max()
        .unwrap_or(0)
        .max("Function".len());
    let border = format!("+-{}-+-{}-+\n", "-".repeat(key_width), "-".repeat(desc_width));

    let mut table = border.clone();
    table.push_str(&format!("| {:<key_width$} | {:<desc_width$} |\n", "Dork", "Function"));
    table.push_str(&border);
    for dork in Dork::ALL {
        table.push_str(&format!(
            "| {:<key_width$} | {:<desc_width$} |\n",
            dork.key(),
            dork.description()
        ));
    }
    table.push_str(&border);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("duck-dorker").chain(args.iter().copied()))
    }

    #[test]
    fn test_query_and_dork_are_exclusive() {
        let err = parse(&["--query", "secrets", "--dorks", "log_files"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_unknown_dork_rejected_at_parse_time() {
        let err = parse(&["--dorks", "open_buckets"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_zero_pages_rejected() {
        assert!(parse(&["--query", "x", "--pages", "0"]).is_err());
    }

    #[test]
    fn test_search_target_required() {
        let cli = parse(&["--pages", "2"]).unwrap();
        assert_eq!(cli.validate().unwrap_err().kind(), ErrorKind::MissingRequiredArgument);

        let cli = parse(&["--list-dorks"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_dork_resolution() {
        let cli = parse(&["--dorks", "dir_listing", "--domain", "cia.gov", "--export", "csv"]).unwrap();

        assert_eq!(cli.dorks, Some(Dork::DirListing));
        assert_eq!(cli.export, ExportFormat::Csv);
        assert_eq!(cli.resolve_query().unwrap(), "site:cia.gov intitle:index.of");
    }

    #[test]
    fn test_domain_scoped_query_resolution() {
        let cli = parse(&["--query", "secrets", "--domain", "example.org"]).unwrap();
        assert_eq!(cli.resolve_query().unwrap(), "site:example.org secrets");
        assert_eq!(cli.export, ExportFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--query",
            "secrets",
            "--pages",
            "5",
            "--headless",
            "--output-dir",
            "/tmp/out",
        ])
        .unwrap();
        let mut config = Config::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.search.page_budget, 5);
        assert!(config.browser.headless);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_dork_table_lists_every_dork() {
        let table = dork_table();
        for dork in Dork::ALL {
            assert!(table.contains(dork.key()));
            assert!(table.contains(dork.description()));
        }
    }
}
