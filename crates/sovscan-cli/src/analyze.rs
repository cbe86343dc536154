//! `analyze` command: wires the production clients into an orchestrator and
//! runs it with Ctrl-C cancellation and streamed progress.

use std::sync::Arc;

use sovscan_core::{AnalysisConfig, AppConfig, BrandRoster, ProgressEvent};
use sovscan_detect::{
    BrandDetector, InferenceClient, InferenceDetector, NarrativeWriter, OpenAiClient,
};
use sovscan_pipeline::{Orchestrator, RunOutcome};
use sovscan_scraper::{ContentFetcher, FetchSettings, RelayClient};
use sovscan_search::GoogleSearchClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{render, OutputFormat};

/// Lower bound on the inference request timeout.
const MIN_INFERENCE_TIMEOUT_SECS: u64 = 60;

/// Run one analysis and print the report.
///
/// # Errors
///
/// Returns an error if credentials are missing, the roster cannot be loaded,
/// a client cannot be built, or the run fails in the search stage.
pub(crate) async fn run_analyze(
    config: &AnalysisConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let app = sovscan_core::load_app_config_from_env()?;
    tracing::debug!(?app, "configuration loaded");
    let roster = sovscan_core::load_roster(app.brands_path.as_deref())?;
    let orchestrator = build_orchestrator(&app, roster)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping at the next batch boundary");
                cancel.cancel();
            }
        })
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            tracing::info!(
                stage = event.stage_index,
                stages = event.stage_count,
                percent = event.percent_complete,
                "{}",
                event.stage_label
            );
        }
    });

    let outcome = orchestrator.run(config, Some(tx), &cancel).await;
    interrupt.abort();
    // The sender is dropped with the run, so this drains and finishes.
    progress.await.ok();

    match outcome? {
        RunOutcome::Completed(report) => match format {
            OutputFormat::Text => print!("{}", render::markdown(&report)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        },
        RunOutcome::Cancelled => eprintln!("analysis cancelled; no report produced"),
    }
    Ok(())
}

fn build_orchestrator(app: &AppConfig, roster: BrandRoster) -> anyhow::Result<Orchestrator> {
    let search = GoogleSearchClient::with_base_url(
        &app.google_api_key,
        &app.google_cse_id,
        app.request_timeout_secs,
        &app.user_agent,
        &app.search_base_url,
    )?
    .with_page_delay_ms(app.search_page_delay_ms);

    let relay = RelayClient::with_base_url(
        app.request_timeout_secs,
        &app.user_agent,
        &app.relay_base_url,
    )?;
    let fetcher = ContentFetcher::new(
        Arc::new(relay),
        FetchSettings {
            batch_size: app.fetch_batch_size,
            max_attempts: app.fetch_max_attempts,
            retry_delay_ms: app.fetch_retry_delay_ms,
            batch_delay_ms: app.fetch_batch_delay_ms,
            min_text_chars: app.min_content_chars,
        },
    );

    let inference: Arc<dyn InferenceClient> = Arc::new(OpenAiClient::with_base_url(
        &app.openai_api_key,
        &app.openai_model,
        app.request_timeout_secs.max(MIN_INFERENCE_TIMEOUT_SECS),
        &app.user_agent,
        &app.openai_base_url,
    )?);
    let detector = BrandDetector::new(Arc::new(InferenceDetector::new(Arc::clone(&inference))));

    Ok(Orchestrator::new(Arc::new(search), fetcher, detector)
        .with_narrative(NarrativeWriter::new(inference))
        .with_roster(roster))
}
