use std::path::PathBuf;

use clap::Parser;

mod config;
mod db;
mod error;
mod ingest;
mod models;
mod progress;
mod source;

use config::Config;
use db::Repository;
use error::Result;
use ingest::Importer;
use progress::Progress;
use source::{discover, SourceRegistry};

/// Merge per-source CSV headline archives into one SQLite database.
#[derive(Debug, Parser)]
#[command(name = "headline-merge", version, about)]
struct Cli {
    /// Directory of collection/year subdirectories holding <SourceName>.csv files
    data_directory: PathBuf,

    /// Source registry CSV with NAME and RSS_URL columns
    sources_path: PathBuf,

    /// SQLite database file to create or extend
    storage_path: PathBuf,

    /// Rows to accumulate before deduplicating and inserting a batch
    #[arg(long)]
    cutoff: Option<usize>,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config =
        Config::load(cli.config.as_deref())?.with_overrides(cli.cutoff, cli.no_progress)?;

    // Resolve every file to its feed before touching the database
    let registry = SourceRegistry::load(&cli.sources_path)?;
    let files = discover(&cli.data_directory, &registry)?;

    let repository = Repository::new(&cli.storage_path).await?;

    // Feeds first so every headline has a row to reference
    let added = repository.register_feeds(registry.feeds().to_vec()).await?;
    tracing::info!("Registered {} new feeds of {}", added, registry.feeds().len());

    let progress = if config.show_progress {
        Progress::new(files.len())
    } else {
        Progress::hidden()
    };

    let stats = Importer::new(&repository, config.cutoff)
        .with_progress(progress)
        .run(&files)
        .await?;

    let total = repository.count_headlines().await?;
    tracing::info!(
        "Stored {} new headlines ({} already present) in {} insert attempts over {:.1?}",
        stats.rows_stored,
        stats.rows_dropped,
        stats.attempts,
        stats.elapsed
    );

    println!("{}", stats);
    println!("Database now holds {} headlines", total);

    Ok(())
}
