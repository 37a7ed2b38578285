use anyhow::Context;
use clap::Parser;
use duck_dorker::cli::{self, Cli};
use duck_dorker::config::{Config, ConfigManager, FileConfigManager};
use duck_dorker::session::{SearchSession, SessionConfig};
use duck_dorker::storage::{ExportFormat, ExportOutcome, Exporter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so text results on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    if cli.list_dorks {
        print!("{}", cli::dork_table());
        return Ok(());
    }

    let mut config = match cli.config {
        Some(ref path) => FileConfigManager::new(path.clone()).load_config().await?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    // configuration faults surface here, before a browser exists
    let query = cli.resolve_query()?;
    info!("Searching for: {}", query);

    let session = SearchSession::launch(SessionConfig::from_config(&config))
        .await
        .context("could not start the browser")?;
    let results = session.run(&query).await;

    if results.is_empty() {
        warn!("No results found");
        if cli.export == ExportFormat::Csv {
            return Ok(());
        }
    }

    let exporter = Exporter::new(config.output.directory.clone());
    match exporter.export(results.as_slice(), cli.export)? {
        ExportOutcome::Written { path, count } => {
            info!("Exported {} results to {}", count, path.display())
        }
        ExportOutcome::Printed { count } => info!("Printed {} results", count),
    }

    info!("duck-dorker finished.");
    Ok(())
}
