mod extract;
mod scrape;
mod sink;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "offscrape-cli")]
#[command(about = "Open Food Facts product page scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every product listed in an input file and write the records
    Scrape(ScrapeArgs),
    /// Classify and extract a saved product page, printing the record as JSON
    Extract {
        /// Path to the saved HTML page
        #[arg(long)]
        html: PathBuf,

        /// URL the page was served from (used for barcode backfill and `source`)
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(offscrape_core::log_level_from_env()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Scrape(args)) => {
            let config = offscrape_core::load_scrape_config_from_env()?;
            scrape::run_scrape(config, args).await?;
        }
        Some(Commands::Extract { html, url }) => extract::run_extract(&html, &url)?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}
