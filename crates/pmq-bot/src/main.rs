//! Binary-market quoting engine: replay entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Quote a 15-minute binary market against a recorded book file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PMQ_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the replay book file from the configuration
    #[arg(short, long)]
    book: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pmq_telemetry::init_logging()?;

    info!("Starting pmq-bot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            pmq_bot::AppConfig::from_file(&path)?
        }
        None => pmq_bot::AppConfig::load()?,
    };
    if let Some(book) = args.book {
        config.replay.book_file = book;
    }
    info!(
        instrument = %config.strategy.instrument_id,
        book_file = %config.replay.book_file,
        "Configuration loaded"
    );

    let mut app = pmq_bot::Application::new(config)?;
    let summary = app.run().await?;
    info!(quotes = summary.quotes, fills = summary.fills, "Done");

    Ok(())
}
