//! Runs one analysis end to end.
//!
//! Stages execute strictly in order. Search failures abort the run; every
//! later per-page failure is recorded on that page and the run carries on.
//! Cancellation is observed between stages and at fetch/detection batch
//! boundaries, after which nothing more is reported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use sovscan_core::{
    AnalysisConfig, AnalysisReport, BrandRoster, DetectionMethod, FetchResult, FetchStats,
    PageAnalysis, ProgressEvent, SearchHit, Stage,
};
use sovscan_detect::{BrandDetector, NarrativeInput, NarrativeWriter};
use sovscan_scraper::ContentFetcher;
use sovscan_search::{SearchError, SearchProvider};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::aggregate::{aggregate, round2, Aggregate};
use crate::error::PipelineError;
use crate::progress::ProgressReporter;

/// Pages analyzed concurrently per detection batch.
pub const DETECTION_BATCH_SIZE: usize = 3;

const NO_CONTENT_REASON: &str = "No content available for analysis";

/// How a run ended when it did not fail.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Box<AnalysisReport>),
    /// The caller cancelled; no report is produced.
    Cancelled,
}

/// Composes search, fetch, detection and aggregation into one run.
pub struct Orchestrator {
    search: Arc<dyn SearchProvider>,
    fetcher: ContentFetcher,
    detector: BrandDetector,
    narrative: Option<NarrativeWriter>,
    roster: BrandRoster,
    detection_batch_size: usize,
    running: AtomicBool,
}

/// Clears the running flag however the run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: ContentFetcher,
        detector: BrandDetector,
    ) -> Self {
        Self {
            search,
            fetcher,
            detector,
            narrative: None,
            roster: BrandRoster::default(),
            detection_batch_size: DETECTION_BATCH_SIZE,
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_narrative(mut self, writer: NarrativeWriter) -> Self {
        self.narrative = Some(writer);
        self
    }

    #[must_use]
    pub fn with_roster(mut self, roster: BrandRoster) -> Self {
        self.roster = roster;
        self
    }

    #[must_use]
    pub fn with_detection_batch_size(mut self, size: usize) -> Self {
        self.detection_batch_size = size.max(1);
        self
    }

    /// Whether a run is currently in progress on this instance.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute one analysis run.
    ///
    /// Progress events are sent to `progress` in order, with non-decreasing
    /// `percent_complete` ending at 100 on success.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Configuration`] if `config` is invalid; no stage runs.
    /// - [`PipelineError::AlreadyRunning`] if another run is active.
    /// - [`PipelineError::Search`] if search fails or finds nothing.
    pub async fn run(
        &self,
        config: &AnalysisConfig,
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, PipelineError> {
        config.validate()?;

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PipelineError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let keyword = config.keyword();
        let target_brand = config.target_brand();
        let mut reporter = ProgressReporter::new(progress);

        tracing::info!(
            %run_id,
            keyword,
            target_brand,
            max_results = config.max_results,
            "analysis run started"
        );

        // Searching
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Searching));
        }
        reporter.stage_started(Stage::Searching);
        let search_clock = Instant::now();
        let hits = self.search.search(keyword, config.max_results).await?;
        if hits.is_empty() {
            return Err(SearchError::NoResults {
                keyword: keyword.to_string(),
            }
            .into());
        }
        let search_duration_ms = elapsed_ms(search_clock);
        tracing::info!(%run_id, hits = hits.len(), search_duration_ms, "search complete");

        // Fetching
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Fetching));
        }
        reporter.stage_started(Stage::Fetching);
        let Some(fetches) = self
            .fetcher
            .fetch_all(&hits, cancel, |p| {
                reporter.within_stage(Stage::Fetching, p.completed, p.total);
            })
            .await
        else {
            return Ok(cancelled(run_id, Stage::Fetching));
        };

        // Detecting
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Detecting));
        }
        reporter.stage_started(Stage::Detecting);
        let roster = self.roster.for_target(target_brand);
        let Some(pages) = self
            .analyze_pages(keyword, &hits, fetches, &roster, cancel, &mut reporter)
            .await
        else {
            return Ok(cancelled(run_id, Stage::Detecting));
        };

        // Aggregating
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Aggregating));
        }
        reporter.stage_started(Stage::Aggregating);
        let agg = aggregate(&pages, target_brand);

        // Summarizing
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Summarizing));
        }
        reporter.stage_started(Stage::Summarizing);
        let narrative_summary = self.summarize(keyword, target_brand, &agg).await;

        // Finalizing
        if cancel.is_cancelled() {
            return Ok(cancelled(run_id, Stage::Finalizing));
        }
        reporter.stage_started(Stage::Finalizing);

        let report = build_report(
            run_id,
            config,
            pages,
            agg,
            narrative_summary,
            search_duration_ms,
            started_at,
            clock,
        );

        tracing::info!(
            %run_id,
            pages = report.total_pages_analyzed,
            successful_fetches = report.successful_fetch_count,
            total_mentions = report.total_mentions,
            brands = report.total_brands_found,
            target_rank = ?report.target_brand_rank,
            duration_ms = report.duration_ms,
            "analysis run complete"
        );

        Ok(RunOutcome::Completed(Box::new(report)))
    }

    /// Detect mentions for every page, `detection_batch_size` at a time.
    ///
    /// Returns `None` if cancellation is observed at a batch boundary.
    async fn analyze_pages(
        &self,
        keyword: &str,
        hits: &[SearchHit],
        fetches: Vec<FetchResult>,
        roster: &[String],
        cancel: &CancellationToken,
        reporter: &mut ProgressReporter,
    ) -> Option<Vec<PageAnalysis>> {
        let total = hits.len();
        let work: Vec<(SearchHit, FetchResult)> = hits.iter().cloned().zip(fetches).collect();
        let mut pages = Vec::with_capacity(total);

        for batch in work.chunks(self.detection_batch_size) {
            if cancel.is_cancelled() {
                return None;
            }
            let analyzed = join_all(
                batch
                    .iter()
                    .map(|(hit, fetch)| self.analyze_page(keyword, hit, fetch, roster)),
            )
            .await;
            pages.extend(analyzed);

            if cancel.is_cancelled() {
                return None;
            }
            reporter.within_stage(Stage::Detecting, pages.len(), total);
        }

        Some(pages)
    }

    async fn analyze_page(
        &self,
        keyword: &str,
        hit: &SearchHit,
        fetch: &FetchResult,
        roster: &[String],
    ) -> PageAnalysis {
        if !fetch.success || fetch.extracted_text.is_empty() {
            return PageAnalysis {
                source_hit: hit.clone(),
                fetch: fetch.clone(),
                mentions: Vec::new(),
                analysis_succeeded: false,
                failure_reason: Some(NO_CONTENT_REASON.to_string()),
                method: DetectionMethod::Skipped,
                confidence: 0.0,
                category_relevance: None,
                new_brands_found: Vec::new(),
            };
        }

        match self
            .detector
            .detect(keyword, &fetch.extracted_text, roster)
            .await
        {
            Ok(detection) => PageAnalysis {
                source_hit: hit.clone(),
                fetch: fetch.clone(),
                confidence: round2(detection.mean_confidence()),
                mentions: detection.mentions,
                analysis_succeeded: true,
                failure_reason: None,
                method: detection.method,
                category_relevance: detection.category_relevance,
                new_brands_found: detection.new_brands_found,
            },
            Err(e) => {
                tracing::warn!(url = %hit.url, error = %e, "brand detection failed for page");
                PageAnalysis {
                    source_hit: hit.clone(),
                    fetch: fetch.clone(),
                    mentions: Vec::new(),
                    analysis_succeeded: false,
                    failure_reason: Some(e.to_string()),
                    method: DetectionMethod::Fallback,
                    confidence: 0.0,
                    category_relevance: None,
                    new_brands_found: Vec::new(),
                }
            }
        }
    }

    async fn summarize(
        &self,
        keyword: &str,
        target_brand: &str,
        agg: &Aggregate,
    ) -> Option<String> {
        let writer = self.narrative.as_ref()?;
        let target = agg.target_total();
        let input = NarrativeInput {
            keyword,
            target_brand,
            target_sov_percent: target.map(|t| t.sov_percent),
            target_brand_rank: agg.target_brand_rank,
            total_brands_found: agg.brand_totals.len(),
            total_mentions: agg.total_mentions,
            brand_totals: &agg.brand_totals,
        };
        Some(writer.compose_or_fallback(&input).await)
    }
}

fn cancelled(run_id: Uuid, stage: Stage) -> RunOutcome {
    tracing::info!(
        %run_id,
        stage = stage.index(),
        label = stage.label(),
        "analysis run cancelled"
    );
    RunOutcome::Cancelled
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    run_id: Uuid,
    config: &AnalysisConfig,
    pages: Vec<PageAnalysis>,
    agg: Aggregate,
    narrative_summary: Option<String>,
    search_duration_ms: u64,
    started_at: chrono::DateTime<Utc>,
    clock: Instant,
) -> AnalysisReport {
    let fetch_stats = FetchStats::from_results(pages.iter().map(|p| &p.fetch));
    #[allow(clippy::cast_precision_loss)]
    let avg_confidence = if pages.is_empty() {
        0.0
    } else {
        round2(pages.iter().map(|p| p.confidence).sum::<f64>() / pages.len() as f64)
    };
    let target_brand_total = agg.target_total().cloned();

    AnalysisReport {
        run_id,
        keyword: config.keyword().to_string(),
        target_brand: config.target_brand().to_string(),
        category: config
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        total_pages_analyzed: pages.len(),
        successful_fetch_count: fetch_stats.successful,
        total_brands_found: agg.brand_totals.len(),
        pages,
        target_brand_total,
        brand_totals: agg.brand_totals,
        target_brand_rank: agg.target_brand_rank,
        total_mentions: agg.total_mentions,
        fetch_stats,
        avg_confidence,
        search_duration_ms,
        narrative_summary,
        started_at,
        finished_at: Utc::now(),
        duration_ms: elapsed_ms(clock),
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
