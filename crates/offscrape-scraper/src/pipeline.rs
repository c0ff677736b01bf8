//! Per-target acquisition: primary fetch, classification, one fallback
//! fetch, extraction.
//!
//! Targets are processed one at a time in input order. A failing target is
//! recorded in the report and the run moves on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use offscrape_core::{CoreError, ProductRecord, ScrapeTarget};
use scraper::Html;

use crate::classify::classify_document;
use crate::client::{FetchOutcome, ProductPageClient};
use crate::error::ScraperError;
use crate::extract::{extract_from_document, extract_product};
use crate::normalize::UrlNormalizer;

/// Where a target was in its acquisition when it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing fetched yet.
    Start,
    /// Primary page fetched, not yet classified.
    FetchedPrimary,
    /// Primary page confirmed as a product page.
    Classified,
    /// Primary page rejected; fallback page fetched.
    FetchedFallback,
    Extracted,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::FetchedPrimary => "fetched_primary",
            Self::Classified => "classified",
            Self::FetchedFallback => "fetched_fallback",
            Self::Extracted => "extracted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A target that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: ScrapeTarget,
    /// 1-based position in the input list.
    pub position: usize,
    /// The stage the target was in when the failing step ran.
    pub stage: Stage,
    pub error: String,
}

/// Result of a run: records in input order plus the targets that failed.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub records: Vec<ProductRecord>,
    pub failures: Vec<TargetFailure>,
    /// `true` if the stop flag ended the run before every target was tried.
    pub interrupted: bool,
}

/// Internal state machine. Each variant carries what the next step needs.
enum Step {
    Start,
    FetchedPrimary(FetchOutcome),
    /// Extraction already ran on the parse used for classification.
    Classified(Result<ProductRecord, CoreError>),
    FetchedFallback(FetchOutcome),
    Extracted(ProductRecord),
    Failed { stage: Stage, error: ScraperError },
}

impl Step {
    fn stage(&self) -> Stage {
        match self {
            Self::Start => Stage::Start,
            Self::FetchedPrimary(_) => Stage::FetchedPrimary,
            Self::Classified(_) => Stage::Classified,
            Self::FetchedFallback(_) => Stage::FetchedFallback,
            Self::Extracted(_) => Stage::Extracted,
            Self::Failed { .. } => Stage::Failed,
        }
    }

    fn failed(stage: Stage, error: impl Into<ScraperError>) -> Self {
        Self::Failed {
            stage,
            error: error.into(),
        }
    }
}

/// Drives targets through fetch, classify, fallback and extract.
pub struct ScrapeSession {
    client: ProductPageClient,
    normalizer: UrlNormalizer,
    polite_delay: Duration,
}

impl ScrapeSession {
    #[must_use]
    pub fn new(
        client: ProductPageClient,
        normalizer: UrlNormalizer,
        polite_delay: Duration,
    ) -> Self {
        Self {
            client,
            normalizer,
            polite_delay,
        }
    }

    /// Processes `targets` in order until done or until `stop` is set.
    ///
    /// `stop` is checked before each target; a target already in flight is
    /// finished. The polite delay is awaited between targets, never after
    /// the last one.
    pub async fn run(&self, targets: &[ScrapeTarget], stop: &AtomicBool) -> ScrapeReport {
        let mut report = ScrapeReport::default();
        let total = targets.len();

        for (idx, target) in targets.iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                tracing::warn!(
                    remaining = total - idx,
                    "stop requested; skipping remaining targets"
                );
                report.interrupted = true;
                break;
            }

            let position = idx + 1;
            tracing::info!(input = %target, position, total, "processing target");

            match self.process(target).await {
                Ok(record) => {
                    tracing::info!(
                        input = %target,
                        position,
                        index = record.index(),
                        "product extracted"
                    );
                    report.records.push(record);
                }
                Err((stage, error)) => {
                    tracing::warn!(
                        input = %target,
                        position,
                        stage = %stage,
                        error = %error,
                        "target failed"
                    );
                    report.failures.push(TargetFailure {
                        target: target.clone(),
                        position,
                        stage,
                        error: error.to_string(),
                    });
                }
            }

            if position < total && !self.polite_delay.is_zero() {
                tokio::time::sleep(self.polite_delay).await;
            }
        }

        tracing::info!(
            records = report.records.len(),
            failures = report.failures.len(),
            interrupted = report.interrupted,
            "scrape run finished"
        );
        report
    }

    /// Runs one target to a terminal step. On failure, returns the stage the
    /// target was in when the failing step ran.
    async fn process(
        &self,
        target: &ScrapeTarget,
    ) -> Result<ProductRecord, (Stage, ScraperError)> {
        let primary_url = self.normalizer.primary_url(target);
        let mut step = Step::Start;

        loop {
            step = match step {
                Step::Start => match self.client.fetch(&primary_url).await {
                    Ok(outcome) => Step::FetchedPrimary(outcome),
                    Err(err) => Step::failed(Stage::Start, err),
                },
                Step::FetchedPrimary(outcome) => {
                    if let Some(extracted) = extract_if_product(&outcome) {
                        Step::Classified(extracted)
                    } else {
                        let fallback_url =
                            self.normalizer.fallback_url(target, &outcome.final_url);
                        tracing::info!(
                            input = %target,
                            primary = %outcome.final_url,
                            fallback = %fallback_url,
                            "not a product page; trying fallback locale"
                        );
                        match self.client.fetch(&fallback_url).await {
                            Ok(fallback) => Step::FetchedFallback(fallback),
                            Err(err) => Step::failed(Stage::FetchedPrimary, err),
                        }
                    }
                }
                Step::Classified(extracted) => finish(extracted, Stage::Classified),
                Step::FetchedFallback(outcome) => extract_step(&outcome, Stage::FetchedFallback),
                Step::Extracted(record) => return Ok(record),
                Step::Failed { stage, error } => return Err((stage, error)),
            };
            tracing::trace!(input = %target, stage = %step.stage(), "advanced");
        }
    }
}

/// Parses the primary page once for both classification and extraction.
/// `None` when the page carries no product signal. `Html` is not `Send`, so it
/// must not escape into the async caller.
fn extract_if_product(outcome: &FetchOutcome) -> Option<Result<ProductRecord, CoreError>> {
    let document = Html::parse_document(&outcome.html);
    let signal = classify_document(&document)?;
    tracing::debug!(url = %outcome.final_url, signal = %signal, "product page");
    Some(extract_from_document(&document, &outcome.final_url))
}

/// The fallback page is extracted without being classified again.
fn extract_step(outcome: &FetchOutcome, stage: Stage) -> Step {
    finish(extract_product(&outcome.html, &outcome.final_url), stage)
}

fn finish(extracted: Result<ProductRecord, CoreError>, stage: Stage) -> Step {
    match extracted {
        Ok(record) => Step::Extracted(record),
        Err(err) => Step::failed(stage, err),
    }
}
