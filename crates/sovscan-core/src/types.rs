use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub display_domain: String,
    /// 1-based position in the final ordering; dense within a run.
    pub rank: u32,
}

/// Outcome of fetching and extracting one candidate page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    /// Plain text; empty when the fetch failed.
    pub extracted_text: String,
    /// Length of `extracted_text` in characters.
    pub content_length: usize,
    pub success: bool,
    pub error_detail: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    #[must_use]
    pub fn succeeded(url: impl Into<String>, extracted_text: String) -> Self {
        Self {
            url: url.into(),
            content_length: extracted_text.chars().count(),
            extracted_text,
            success: true,
            error_detail: None,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(url: impl Into<String>, error_detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extracted_text: String::new(),
            content_length: 0,
            success: false,
            error_detail: Some(error_detail.into()),
            fetched_at: Utc::now(),
        }
    }
}

/// Mentions of one brand on one page. Zero-count mentions are never built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandMention {
    pub brand_name: String,
    pub mention_count: u32,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
    /// At most three short snippets around a mention, in text order.
    pub sample_contexts: Vec<String>,
}

/// Which detection path produced a page's mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Inference,
    Fallback,
    /// Detection never ran: no usable content, or text below the minimum length.
    Skipped,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::Inference => write!(f, "inference"),
            DetectionMethod::Fallback => write!(f, "fallback"),
            DetectionMethod::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub source_hit: SearchHit,
    pub fetch: FetchResult,
    pub mentions: Vec<BrandMention>,
    pub analysis_succeeded: bool,
    pub failure_reason: Option<String>,
    pub method: DetectionMethod,
    /// Mean confidence over `mentions`; 0 when there are none.
    pub confidence: f64,
    pub category_relevance: Option<f64>,
    pub new_brands_found: Vec<String>,
}

impl PageAnalysis {
    #[must_use]
    pub fn total_mentions(&self) -> u64 {
        self.mentions
            .iter()
            .map(|m| u64::from(m.mention_count))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandTotal {
    pub brand_name: String,
    pub total_mentions: u64,
    /// Rounded to two decimals.
    pub sov_percent: f64,
    pub is_target_brand: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_content_length: f64,
}

impl FetchStats {
    #[must_use]
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a FetchResult>,
    {
        let mut total = 0usize;
        let mut successful = 0usize;
        let mut chars = 0usize;
        for r in results {
            total += 1;
            if r.success {
                successful += 1;
            }
            chars += r.content_length;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg_content_length = if total == 0 {
            0.0
        } else {
            chars as f64 / total as f64
        };
        Self {
            total,
            successful,
            failed: total - successful,
            avg_content_length,
        }
    }
}

/// Terminal artifact of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub keyword: String,
    pub target_brand: String,
    pub category: Option<String>,
    pub pages: Vec<PageAnalysis>,
    /// Ranked: SOV descending, then mentions descending, then name ascending.
    pub brand_totals: Vec<BrandTotal>,
    /// 1-based; `None` iff the target brand was never mentioned.
    pub target_brand_rank: Option<usize>,
    pub target_brand_total: Option<BrandTotal>,
    pub total_mentions: u64,
    pub total_brands_found: usize,
    pub total_pages_analyzed: usize,
    pub successful_fetch_count: usize,
    pub fetch_stats: FetchStats,
    pub avg_confidence: f64,
    pub search_duration_ms: u64,
    pub narrative_summary: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}
