//! Inference-backed brand detection.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sovscan_core::{BrandMention, DetectionMethod};

use crate::detector::{Detection, MentionDetector};
use crate::error::DetectionError;
use crate::inference::{CompletionRequest, InferenceClient};

/// Page text beyond this many characters is not sent to the backend.
pub const MAX_PROMPT_CHARS: usize = 4_000;

/// Mentions reported below this confidence are discarded.
pub const MIN_CONFIDENCE: f64 = 0.6;

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 1_500;
const MAX_CONTEXTS: usize = 3;
const SCHEMA_NAME: &str = "brand_analysis_response";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    #[serde(default)]
    brands: Vec<ReportedBrand>,
    #[serde(default)]
    category_relevance: Option<f64>,
    #[serde(default)]
    new_brands_found: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReportedBrand {
    name: String,
    #[serde(default)]
    mentions: f64,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    contexts: Vec<String>,
}

/// Asks an [`InferenceClient`] to find roster brands in a page.
pub struct InferenceDetector {
    client: Arc<dyn InferenceClient>,
}

impl InferenceDetector {
    #[must_use]
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MentionDetector for InferenceDetector {
    fn is_available(&self) -> bool {
        self.client.is_available()
    }

    async fn detect(
        &self,
        keyword: &str,
        text: &str,
        roster: &[String],
    ) -> Result<Detection, DetectionError> {
        let request = detection_request(keyword, text, roster);
        let content = self.client.complete(&request).await?;
        let detection = parse_detection(&content)?;
        tracing::debug!(
            keyword,
            brands = detection.mentions.len(),
            "inference detection complete"
        );
        Ok(detection)
    }
}

fn detection_request(keyword: &str, text: &str, roster: &[String]) -> CompletionRequest {
    let known = if roster.is_empty() {
        String::new()
    } else {
        format!("Known brands to look for: {}", roster.join(", "))
    };
    let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();

    CompletionRequest {
        system: format!(
            "You are a brand analysis expert. Analyze the given content for brand mentions \
             related to \"{keyword}\". {known}\n\
             Return JSON with: brands (name, mentions, confidence 0 to 1, contexts), \
             totalMentions, categoryRelevance (0 to 1) and newBrandsFound \
             (brands not in the known list)."
        ),
        user: format!(
            "Analyze this content for brand mentions related to \"{keyword}\":\n\n{excerpt}"
        ),
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        response_schema: Some((SCHEMA_NAME.to_string(), response_schema())),
    }
}

fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "brands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "mentions": { "type": "number" },
                        "confidence": { "type": "number" },
                        "contexts": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["name", "mentions", "confidence", "contexts"]
                }
            },
            "totalMentions": { "type": "number" },
            "categoryRelevance": { "type": "number" },
            "newBrandsFound": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["brands", "totalMentions", "categoryRelevance", "newBrandsFound"]
    })
}

/// Parses the backend's JSON answer, dropping low-confidence and zero-count
/// entries.
fn parse_detection(content: &str) -> Result<Detection, DetectionError> {
    let parsed: AnalysisResponse = serde_json::from_str(content.trim())
        .map_err(|e| DetectionError::MalformedResponse { source: e })?;

    let mentions = parsed
        .brands
        .into_iter()
        .filter_map(|b| {
            let name = b.name.trim();
            let count = mention_count(b.mentions);
            let confident = b.confidence >= MIN_CONFIDENCE;
            if name.is_empty() || count == 0 || !confident {
                return None;
            }
            let mut contexts = b.contexts;
            contexts.truncate(MAX_CONTEXTS);
            Some(BrandMention {
                brand_name: name.to_string(),
                mention_count: count,
                confidence: b.confidence.min(1.0),
                sample_contexts: contexts,
            })
        })
        .collect();

    Ok(Detection {
        mentions,
        method: DetectionMethod::Inference,
        category_relevance: parsed
            .category_relevance
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 1.0)),
        new_brands_found: parsed
            .new_brands_found
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mention_count(reported: f64) -> u32 {
    if !reported.is_finite() || reported < 0.5 {
        return 0;
    }
    reported.round().min(f64::from(u32::MAX)) as u32
}
