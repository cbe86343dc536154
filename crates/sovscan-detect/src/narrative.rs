//! Best-effort prose summary of a finished analysis.

use std::fmt::Write as _;
use std::sync::Arc;

use sovscan_core::BrandTotal;

use crate::error::InferenceError;
use crate::inference::{CompletionRequest, InferenceClient};

/// Substituted whenever the narrative cannot be generated.
pub const FALLBACK_NARRATIVE: &str = "Unable to generate analysis summary at this time.";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 500;
const TOP_BRANDS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a marketing analyst expert. Generate a concise, \
professional analysis summary based on brand share of voice data. Focus on key insights, \
competitive positioning, and actionable recommendations.";

/// Figures the narrative is written from.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub keyword: &'a str,
    pub target_brand: &'a str,
    pub target_sov_percent: Option<f64>,
    pub target_brand_rank: Option<usize>,
    pub total_brands_found: usize,
    pub total_mentions: u64,
    /// Ranked brand totals; only the first five are used.
    pub brand_totals: &'a [BrandTotal],
}

pub struct NarrativeWriter {
    client: Arc<dyn InferenceClient>,
}

impl NarrativeWriter {
    #[must_use]
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Generates the narrative.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the backend is unavailable or fails.
    pub async fn compose(&self, input: &NarrativeInput<'_>) -> Result<String, InferenceError> {
        if !self.client.is_available() {
            return Err(InferenceError::Unavailable(
                "no inference backend configured".to_string(),
            ));
        }
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: narrative_prompt(input),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_schema: None,
        };
        let text = self.client.complete(&request).await?;
        Ok(text.trim().to_string())
    }

    /// Like [`NarrativeWriter::compose`], substituting [`FALLBACK_NARRATIVE`]
    /// on any failure.
    pub async fn compose_or_fallback(&self, input: &NarrativeInput<'_>) -> String {
        match self.compose(input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "narrative generation failed; using fallback text");
                FALLBACK_NARRATIVE.to_string()
            }
        }
    }
}

fn narrative_prompt(input: &NarrativeInput<'_>) -> String {
    let rank = input
        .target_brand_rank
        .map_or_else(|| "Not found".to_string(), |r| r.to_string());

    let mut prompt = format!(
        "Generate a professional analysis summary for this brand voice analysis:\n\n\
         Target Brand: {}\n\
         Target Brand SOV: {:.2}%\n\
         Target Brand Rank: {rank}\n\
         Total Brands Found: {}\n\
         Total Mentions: {}\n\
         Keyword: \"{}\"\n\n\
         Top {TOP_BRANDS} Brands by SOV:\n",
        input.target_brand,
        input.target_sov_percent.unwrap_or(0.0),
        input.total_brands_found,
        input.total_mentions,
        input.keyword,
    );
    for brand in input.brand_totals.iter().take(TOP_BRANDS) {
        let _ = writeln!(prompt, "{}: {:.2}%", brand.brand_name, brand.sov_percent);
    }
    prompt.push_str(
        "\nProvide insights about competitive position, market visibility, and \
         recommendations in 3-4 concise paragraphs.",
    );
    prompt
}
