//! End-to-end runs of the `Orchestrator` against in-process test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use sovscan_core::{
    AnalysisConfig, AnalysisReport, ConfigError, DetectionMethod, ProgressEvent, SearchHit,
};
use sovscan_detect::{
    BrandDetector, CompletionRequest, InferenceClient, InferenceDetector, InferenceError,
    NarrativeWriter, FALLBACK_NARRATIVE,
};
use sovscan_pipeline::{Orchestrator, PipelineError, RunOutcome};
use sovscan_scraper::{ContentFetcher, ContentRelay, FetchError, FetchSettings};
use sovscan_search::{SearchError, SearchProvider};

const FILLER: &str = "Ceiling fans were compared on airflow, noise and power draw during a \
    month of testing in a warm apartment. ";

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

enum SearchMode {
    Hits(Vec<SearchHit>),
    Empty,
    Unavailable,
}

struct FakeSearch {
    mode: SearchMode,
    calls: AtomicU32,
    gate: Option<Arc<Notify>>,
}

impl FakeSearch {
    fn with_urls(urls: &[&str]) -> Arc<Self> {
        let hits = urls
            .iter()
            .zip(1u32..)
            .map(|(url, rank)| SearchHit {
                id: format!("result-{rank}"),
                title: format!("Result {rank}"),
                url: (*url).to_string(),
                snippet: String::new(),
                display_domain: String::new(),
                rank,
            })
            .collect();
        Self::new(SearchMode::Hits(hits))
    }

    fn new(mode: SearchMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicU32::new(0),
            gate: None,
        })
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.mode {
            SearchMode::Hits(hits) => Ok(hits
                .iter()
                .take(max_results as usize)
                .cloned()
                .collect()),
            SearchMode::Empty => Err(SearchError::NoResults {
                keyword: keyword.to_string(),
            }),
            SearchMode::Unavailable => Err(SearchError::Unavailable(
                "API key not valid.".to_string(),
            )),
        }
    }
}

#[derive(Default)]
struct FakeRelay {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
    /// Cancelled as soon as this URL is requested.
    cancel_on: Option<(String, CancellationToken)>,
}

impl FakeRelay {
    fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| {
                    let html = format!("<html><body><p>{body}</p></body></html>");
                    ((*url).to_string(), html)
                })
                .collect(),
            ..Self::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentRelay for FakeRelay {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == url {
                token.cancel();
            }
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::UnexpectedStatus {
                status: 500,
                url: url.to_string(),
            })
    }
}

enum InferenceMode {
    Down,
    Answers { detection: String, narrative: String },
}

struct FakeInference {
    mode: InferenceMode,
    calls: AtomicU32,
    /// Cancelled on every `complete` call.
    cancel_on_call: Option<CancellationToken>,
}

impl FakeInference {
    fn down() -> Arc<Self> {
        Arc::new(Self {
            mode: InferenceMode::Down,
            calls: AtomicU32::new(0),
            cancel_on_call: None,
        })
    }

    fn answering(detection: serde_json::Value, narrative: &str) -> Arc<Self> {
        Arc::new(Self {
            mode: InferenceMode::Answers {
                detection: detection.to_string(),
                narrative: narrative.to_string(),
            },
            calls: AtomicU32::new(0),
            cancel_on_call: None,
        })
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        match &self.mode {
            InferenceMode::Down => Err(InferenceError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            }),
            InferenceMode::Answers {
                detection,
                narrative,
            } => Ok(if request.response_schema.is_some() {
                detection.clone()
            } else {
                narrative.clone()
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn settings() -> FetchSettings {
    FetchSettings {
        batch_size: 3,
        max_attempts: 2,
        retry_delay_ms: 0,
        batch_delay_ms: 0,
        min_text_chars: 100,
    }
}

fn orchestrator(
    search: Arc<FakeSearch>,
    relay: Arc<FakeRelay>,
    inference: Arc<FakeInference>,
) -> Orchestrator {
    let fetcher = ContentFetcher::new(relay, settings());
    let detector = BrandDetector::new(Arc::new(InferenceDetector::new(inference.clone())));
    Orchestrator::new(search, fetcher, detector).with_narrative(NarrativeWriter::new(inference))
}

fn config() -> AnalysisConfig {
    AnalysisConfig::new("smart fan")
        .with_max_results(5)
        .with_target_brand("Atomberg")
        .with_category("Home appliances")
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn completed(outcome: RunOutcome) -> AnalysisReport {
    match outcome {
        RunOutcome::Completed(report) => *report,
        RunOutcome::Cancelled => panic!("expected a completed run"),
    }
}

fn smart_fan_relay() -> FakeRelay {
    let reviews =
        format!("Atomberg Renesa tops our list. {FILLER}Havells comes close, but Atomberg wins.");
    let blog = format!("{FILLER}The Atomberg motor is efficient.");
    let deals = format!("{FILLER}{FILLER}");
    FakeRelay::with_pages(&[
        ("https://reviews.example/fans", reviews.as_str()),
        ("https://blog.example/bldc", blog.as_str()),
        ("https://shop.example/deals", deals.as_str()),
    ])
}

const SMART_FAN_URLS: [&str; 3] = [
    "https://reviews.example/fans",
    "https://blog.example/bldc",
    "https://shop.example/deals",
];

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn smart_fan_scenario_with_inference_down() {
    let search = FakeSearch::with_urls(&SMART_FAN_URLS);
    let relay = Arc::new(smart_fan_relay());
    let orch = orchestrator(search, relay, FakeInference::down());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = orch
        .run(&config(), Some(tx), &CancellationToken::new())
        .await
        .unwrap();
    let report = completed(outcome);

    // 1:1 alignment with search hits.
    assert_eq!(report.pages.len(), 3);
    for (page, url) in report.pages.iter().zip(SMART_FAN_URLS) {
        assert_eq!(page.source_hit.url, url);
        assert_eq!(page.fetch.url, url);
        assert!(page.fetch.success);
        assert!(page.analysis_succeeded);
        assert_eq!(page.method, DetectionMethod::Fallback);
    }

    assert_eq!(report.total_mentions, 4);
    let sum: u64 = report.brand_totals.iter().map(|b| b.total_mentions).sum();
    assert_eq!(sum, report.total_mentions);

    let atomberg = &report.brand_totals[0];
    assert_eq!(atomberg.brand_name, "Atomberg");
    assert_eq!(atomberg.total_mentions, 3);
    assert!((atomberg.sov_percent - 75.0).abs() < 1e-9);
    assert!(atomberg.is_target_brand);
    let havells = &report.brand_totals[1];
    assert_eq!(havells.brand_name, "Havells");
    assert_eq!(havells.total_mentions, 1);
    assert!((havells.sov_percent - 25.0).abs() < 1e-9);

    assert_eq!(report.target_brand_rank, Some(1));
    assert_eq!(report.target_brand_total.as_ref(), Some(atomberg));
    assert_eq!(report.total_brands_found, 2);
    assert_eq!(report.total_pages_analyzed, 3);
    assert_eq!(report.successful_fetch_count, 3);
    assert_eq!(report.fetch_stats.failed, 0);
    assert_eq!(report.category.as_deref(), Some("Home appliances"));
    assert_eq!(report.narrative_summary.as_deref(), Some(FALLBACK_NARRATIVE));
    assert!(report.finished_at >= report.started_at);

    let events = drain(&mut rx);
    let pcts: Vec<u8> = events.iter().map(|e| e.percent_complete).collect();
    assert!(pcts.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {pcts:?}");
    assert_eq!(pcts.first(), Some(&0));
    assert_eq!(pcts.last(), Some(&100));
    let stages: Vec<u32> = events.iter().map(|e| e.stage_index).collect();
    assert!(stages.windows(2).all(|w| w[0] <= w[1]));
    assert!(events.iter().all(|e| e.stage_count == 6));
    assert!(!orch.is_running());
}

#[tokio::test]
async fn inference_answers_are_used_when_available() {
    let search = FakeSearch::with_urls(&SMART_FAN_URLS[..2]);
    let relay = Arc::new(smart_fan_relay());
    let inference = FakeInference::answering(
        serde_json::json!({
            "brands": [
                {
                    "name": "Atomberg",
                    "mentions": 2,
                    "confidence": 0.9,
                    "contexts": ["Atomberg Renesa"]
                },
                { "name": "Crompton", "mentions": 1, "confidence": 0.3, "contexts": [] }
            ],
            "totalMentions": 3,
            "categoryRelevance": 0.8,
            "newBrandsFound": ["Ottomate"]
        }),
        "Atomberg dominates the conversation.",
    );
    let orch = orchestrator(search, relay, inference.clone());

    let report = completed(
        orch.run(&config(), None, &CancellationToken::new())
            .await
            .unwrap(),
    );

    assert!(report
        .pages
        .iter()
        .all(|p| p.method == DetectionMethod::Inference));
    assert_eq!(report.pages[0].new_brands_found, vec!["Ottomate".to_string()]);
    assert_eq!(report.pages[0].category_relevance, Some(0.8));
    assert_eq!(report.total_mentions, 4);
    assert_eq!(report.brand_totals.len(), 1);
    assert!((report.brand_totals[0].sov_percent - 100.0).abs() < 1e-9);
    assert!((report.avg_confidence - 0.9).abs() < 1e-9);
    assert_eq!(
        report.narrative_summary.as_deref(),
        Some("Atomberg dominates the conversation.")
    );
    // Two detections plus one narrative.
    assert_eq!(inference.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn zero_search_hits_is_fatal() {
    let relay = Arc::new(smart_fan_relay());
    let orch = orchestrator(
        FakeSearch::new(SearchMode::Empty),
        Arc::clone(&relay),
        FakeInference::down(),
    );

    let err = orch
        .run(&config(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::Search(SearchError::NoResults { .. })),
        "got: {err:?}"
    );
    assert_eq!(relay.call_count(), 0);
    assert!(!orch.is_running());
}

#[tokio::test]
async fn search_unavailable_is_fatal() {
    let orch = orchestrator(
        FakeSearch::new(SearchMode::Unavailable),
        Arc::new(FakeRelay::default()),
        FakeInference::down(),
    );

    let err = orch
        .run(&config(), None, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::Search(SearchError::Unavailable(_))),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn failed_fetch_is_recorded_and_run_completes() {
    let urls = [
        "https://reviews.example/fans",
        "https://down.example/",
        "https://blog.example/bldc",
    ];
    let relay = Arc::new(smart_fan_relay());
    let orch = orchestrator(
        FakeSearch::with_urls(&urls),
        Arc::clone(&relay),
        FakeInference::down(),
    );

    let report = completed(
        orch.run(&config(), None, &CancellationToken::new())
            .await
            .unwrap(),
    );

    assert_eq!(report.pages.len(), 3);
    let failed = &report.pages[1];
    assert_eq!(failed.source_hit.url, "https://down.example/");
    assert!(!failed.fetch.success);
    assert!(failed.fetch.error_detail.is_some());
    assert!(!failed.analysis_succeeded);
    assert_eq!(
        failed.failure_reason.as_deref(),
        Some("No content available for analysis")
    );
    assert_eq!(failed.method, DetectionMethod::Skipped);

    assert_eq!(report.successful_fetch_count, 2);
    assert_eq!(report.fetch_stats.failed, 1);
    assert_eq!(report.total_mentions, 4);
    assert_eq!(report.target_brand_rank, Some(1));
    // Two attempts for the dead URL, one each for the others.
    assert_eq!(relay.call_count(), 4);
}

#[tokio::test]
async fn cancellation_mid_fetch_returns_no_report_and_stops_progress() {
    let urls: Vec<String> = (1..=6).map(|i| format!("https://p{i}.example/")).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let body = format!("Atomberg {FILLER}");
    let pages: Vec<(&str, &str)> = url_refs.iter().map(|u| (*u, body.as_str())).collect();

    let cancel = CancellationToken::new();
    let mut relay = FakeRelay::with_pages(&pages);
    relay.cancel_on = Some(("https://p2.example/".to_string(), cancel.clone()));
    let relay = Arc::new(relay);

    let inference = FakeInference::down();
    let orch = orchestrator(
        FakeSearch::with_urls(&url_refs),
        Arc::clone(&relay),
        Arc::clone(&inference),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = orch.run(&config(), Some(tx), &cancel).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Cancelled));
    // The in-flight first batch finishes; the second never starts.
    assert_eq!(relay.call_count(), 3);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 0);

    let events = drain(&mut rx);
    let stages: Vec<u32> = events.iter().map(|e| e.stage_index).collect();
    assert_eq!(stages, vec![1, 2], "no events after the fetch boundary");
    assert!(!orch.is_running());
}

#[tokio::test]
async fn cancellation_mid_detection_stops_after_current_batch() {
    let urls: Vec<String> = (1..=6).map(|i| format!("https://p{i}.example/")).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let body = format!("Atomberg {FILLER}");
    let pages: Vec<(&str, &str)> = url_refs.iter().map(|u| (*u, body.as_str())).collect();
    let relay = Arc::new(FakeRelay::with_pages(&pages));

    let cancel = CancellationToken::new();
    let inference = Arc::new(FakeInference {
        mode: InferenceMode::Down,
        calls: AtomicU32::new(0),
        cancel_on_call: Some(cancel.clone()),
    });
    let orch = orchestrator(
        FakeSearch::with_urls(&url_refs),
        Arc::clone(&relay),
        Arc::clone(&inference),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = orch
        .run(&config().with_max_results(6), Some(tx), &cancel)
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Cancelled));
    assert_eq!(relay.call_count(), 6);
    // The first detection batch finishes; the second never starts and no
    // narrative is requested.
    assert_eq!(inference.calls.load(Ordering::SeqCst), 3);

    let events: Vec<(u32, u8)> = drain(&mut rx)
        .iter()
        .map(|e| (e.stage_index, e.percent_complete))
        .collect();
    assert_eq!(events.last(), Some(&(3, 33)), "events: {events:?}");
    assert!(events.iter().all(|(stage, _)| *stage <= 3));
    assert!(!orch.is_running());
}

#[tokio::test]
async fn cancelled_before_start_emits_nothing() {
    let relay = Arc::new(smart_fan_relay());
    let search = FakeSearch::with_urls(&SMART_FAN_URLS);
    let orch = orchestrator(search.clone(), relay, FakeInference::down());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = orch.run(&config(), Some(tx), &cancel).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Cancelled));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_config_fails_before_any_stage() {
    let search = FakeSearch::with_urls(&SMART_FAN_URLS);
    let orch = orchestrator(
        search.clone(),
        Arc::new(smart_fan_relay()),
        FakeInference::down(),
    );
    let bad = AnalysisConfig::new(" x ").with_max_results(99);

    let err = orch
        .run(&bad, None, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PipelineError::Configuration(ConfigError::Invalid(problems)) => {
            assert_eq!(problems.len(), 2, "problems: {problems:?}");
        }
        other => panic!("expected configuration error, got: {other:?}"),
    }
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_concurrent_run_is_rejected() {
    let gate = Arc::new(Notify::new());
    let search = Arc::new(FakeSearch {
        mode: SearchMode::Hits(Vec::new()),
        calls: AtomicU32::new(0),
        gate: Some(Arc::clone(&gate)),
    });
    let orch = orchestrator(search, Arc::new(FakeRelay::default()), FakeInference::down());
    let cfg = config();
    let cancel = CancellationToken::new();

    let first = orch.run(&cfg, None, &cancel);
    let second = async {
        while !orch.is_running() {
            tokio::task::yield_now().await;
        }
        let result = orch.run(&cfg, None, &cancel).await;
        gate.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(second, Err(PipelineError::AlreadyRunning)));
    // The first run proceeds normally; its empty search is still fatal.
    assert!(matches!(first, Err(PipelineError::Search(SearchError::NoResults { .. }))));
    assert!(!orch.is_running());
}

#[tokio::test]
async fn fallback_runs_are_repeatable() {
    let relay = Arc::new(smart_fan_relay());
    let orch = orchestrator(
        FakeSearch::with_urls(&SMART_FAN_URLS),
        relay,
        FakeInference::down(),
    );

    let first = completed(
        orch.run(&config(), None, &CancellationToken::new())
            .await
            .unwrap(),
    );
    let second = completed(
        orch.run(&config(), None, &CancellationToken::new())
            .await
            .unwrap(),
    );

    assert_eq!(first.brand_totals, second.brand_totals);
    for (a, b) in first.pages.iter().zip(&second.pages) {
        assert_eq!(a.mentions, b.mentions);
    }
    assert_ne!(first.run_id, second.run_id);
}
