//! `scrape` command: input file → pipeline → sink file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use offscrape_core::{ConfigError, OutputFormat, ScrapeConfig};
use offscrape_scraper::{FetchSettings, ProductPageClient, ScrapeSession, UrlNormalizer};

use crate::sink;

/// Flags for `scrape`. Each one overrides the matching `OFFSCRAPE_*`
/// environment variable.
#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// File with one product code or product URL per line
    #[arg(long, env = "OFFSCRAPE_INPUT")]
    pub input: PathBuf,

    /// Output format: jsonl or csv
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Seconds to wait between two targets
    #[arg(long)]
    pub delay: Option<f64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Total fetch attempts per URL, first try included
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Directory the output file is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl ScrapeArgs {
    /// Applies the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(delay) = self.delay {
            config.delay_secs = delay;
        }
        if let Some(ua) = &self.user_agent {
            config.user_agent.clone_from(ua);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
    }

    /// Applies the flags to the environment config, then validates the result
    /// once, so a flag can replace a bad environment value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the merged configuration is invalid.
    pub fn resolve(&self, mut config: ScrapeConfig) -> Result<ScrapeConfig, ConfigError> {
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Runs the pipeline over the input file and writes whatever was collected,
/// including after an interrupt.
///
/// # Errors
///
/// Returns an error if the merged configuration is invalid, the input file
/// cannot be read, the HTTP client cannot be built, or the output file
/// cannot be written. Per-target failures are logged and do not fail the
/// command.
pub(crate) async fn run_scrape(config: ScrapeConfig, args: ScrapeArgs) -> anyhow::Result<()> {
    let config = args.resolve(config)?;

    let targets = offscrape_scraper::load_targets(&args.input)
        .with_context(|| format!("cannot load targets from {}", args.input.display()))?;
    tracing::info!(
        count = targets.len(),
        input = %args.input.display(),
        format = %config.output_format,
        "loaded targets"
    );

    let client = ProductPageClient::new(FetchSettings::from_config(&config))
        .context("failed to build HTTP client")?;
    let normalizer = UrlNormalizer::new(&config.primary_base_url, &config.fallback_base_url);
    let session = ScrapeSession::new(client, normalizer, config.delay());

    let stop = Arc::new(AtomicBool::new(false));
    let interrupt = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; finishing the current target");
                stop.store(true, Ordering::Relaxed);
            }
        })
    };

    let report = session.run(&targets, &stop).await;
    interrupt.abort();

    let path = sink::write_records(&report.records, config.output_format, &config.output_dir)?;
    tracing::info!(
        path = %path.display(),
        records = report.records.len(),
        failures = report.failures.len(),
        "output written"
    );

    println!(
        "{} record(s) written to {} ({} failed{})",
        report.records.len(),
        path.display(),
        report.failures.len(),
        if report.interrupted { ", interrupted" } else { "" }
    );
    for failure in &report.failures {
        println!(
            "  #{} {} [{}]: {}",
            failure.position, failure.target, failure.stage, failure.error
        );
    }

    Ok(())
}
