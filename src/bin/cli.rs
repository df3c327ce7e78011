//! Harvester CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvester::{
    config,
    error::{AppError, Result},
    pipeline::{Harvester, StopReason},
    services::{FfmpegTranscoder, HttpClient},
    storage::TrackingStore,
    utils,
};

/// Incremental sample harvester
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Crawls a sample listing, downloads new samples once and transcodes them"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl, download and transcode new samples
    Run {
        /// Listing page to start from
        #[arg(long)]
        start_page: Option<u32>,

        /// Stop after this many new samples
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate configuration and the transcoder
    Validate,

    /// Show tracking document info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Command::Run { start_page, limit } => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(page) = start_page {
                config.source.start_page = page;
            }
            if limit.is_some() {
                config.source.max_downloads = limit;
            }
            config.validate()?;

            let store = TrackingStore::load(config.paths.tracking_path())?;
            let config = Arc::new(config);
            let client = Arc::new(HttpClient::new(&config)?);
            let transcoder = Arc::new(FfmpegTranscoder::new(&config.transcoder));
            if let Err(e) = transcoder.check_available().await {
                log::warn!("Transcoder check failed, conversions will fail: {e}");
            }

            log::info!("Harvester starting...");
            let harvester = Harvester::new(Arc::clone(&config), client, transcoder);

            let report = harvester
                .run_until(store, utils::shutdown_signal())
                .await?;

            match report {
                Some(report) if report.stop == StopReason::AuthFailure => {
                    return Err(AppError::config(
                        "session credentials were rejected; refresh SESSIONID and CSRFTOKEN",
                    ));
                }
                Some(_) => log::info!("Harvest complete!"),
                None => log::warn!(
                    "Interrupted; tracking document saved to {}",
                    config.paths.tracking_path().display()
                ),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = config::load_validated(&cli.config).inspect_err(|e| {
                log::error!("Config validation failed: {}", e);
            })?;
            log::info!("✓ Config OK");

            let transcoder = FfmpegTranscoder::new(&config.transcoder);
            match transcoder.check_available().await {
                Ok(()) => log::info!("✓ Transcoder '{}' OK", config.transcoder.program),
                Err(e) => {
                    log::error!("Transcoder check failed: {}", e);
                    return Err(AppError::validation(e.to_string()));
                }
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            let config = config::load_config(&cli.config)?;
            let store = TrackingStore::load(config.paths.tracking_path())?;

            log::info!("Tracking document: {}", store.path().display());
            log::info!("Tracked samples: {}", store.len());

            let degraded = store.degraded();
            if degraded.is_empty() {
                log::info!("All records carry an author/source-id key");
            } else {
                log::warn!(
                    "{} records have no author/source-id key:",
                    degraded.len()
                );
                for record in degraded {
                    log::warn!("    {}", record.full_name);
                }
            }
            log::info!(
                "Converted files: {}",
                config.paths.converted_path().display()
            );
        }
    }

    Ok(())
}
