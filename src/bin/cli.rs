//! Proceedings scraper CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use proceedings::{
    error::Result,
    models::{Config, YearRange},
    pipeline,
    storage::LocalStorage,
};

/// proceedings - Conference Proceedings Scraper
#[derive(Parser, Debug)]
#[command(
    name = "proceedings",
    version,
    about = "Scrape conference proceedings metadata and PDFs by year"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "proceedings.toml")]
    config: PathBuf,

    /// Output root directory (overrides output.root_dir)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape metadata and PDFs for a range of years
    Scrape {
        /// First year to scrape (default: years.start)
        #[arg(long)]
        start_year: Option<i32>,

        /// Last year to scrape, inclusive (default: years.end)
        #[arg(long)]
        end_year: Option<i32>,

        /// Papers processed concurrently within a year
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Validate the configuration file
    Validate,

    /// Show what has been collected per year
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

    let mut config = Config::load_or_default(&cli.config);
    if let Some(root) = cli.root {
        config.output.root_dir = root;
    }

    match cli.command {
        Command::Scrape {
            start_year,
            end_year,
            concurrency,
        } => {
            config.years = YearRange::new(
                start_year.unwrap_or(config.years.start),
                end_year.unwrap_or(config.years.end),
            );
            if let Some(n) = concurrency {
                config.scraper.max_concurrent = n;
            }
            config.validate()?;

            log::info!("Starting scraping process...");
            let summary = pipeline::run_scrape(&config, config.years).await?;
            log::info!(
                "Recorded {} papers and downloaded {} PDFs into {}",
                summary.recorded(),
                summary.pdf_downloaded(),
                config.output.root_dir.display()
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK: years {}-{}, output {}",
                config.years.start,
                config.years.end,
                config.output.root_dir.display()
            );
        }

        Command::Info => {
            let storage = LocalStorage::new(&config.output.root_dir);
            pipeline::run_info(&storage, config.years).await?;
        }
    }

    Ok(())
}
