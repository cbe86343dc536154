//! The detection capability and the primary/fallback strategy around it.

use std::sync::Arc;

use async_trait::async_trait;
use sovscan_core::{BrandMention, DetectionMethod};

use crate::error::DetectionError;
use crate::lexical::LexicalDetector;

/// Pages with less extracted text than this are not analyzed.
pub const MIN_DETECTABLE_CHARS: usize = 50;

/// Mentions found on one page plus what the detector learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub mentions: Vec<BrandMention>,
    pub method: DetectionMethod,
    pub category_relevance: Option<f64>,
    pub new_brands_found: Vec<String>,
}

impl Detection {
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            mentions: Vec::new(),
            method: DetectionMethod::Skipped,
            category_relevance: None,
            new_brands_found: Vec::new(),
        }
    }

    /// Mean confidence over all mentions; 0 when there are none.
    #[must_use]
    pub fn mean_confidence(&self) -> f64 {
        if self.mentions.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.mentions.iter().map(|m| m.confidence).sum();
        #[allow(clippy::cast_precision_loss)]
        let n = self.mentions.len() as f64;
        sum / n
    }
}

/// Finds roster brands in one page of text.
#[async_trait]
pub trait MentionDetector: Send + Sync {
    /// Checked before every call; an unavailable detector is never invoked.
    fn is_available(&self) -> bool {
        true
    }

    /// # Errors
    ///
    /// Returns [`DetectionError`] when this strategy cannot produce a result.
    async fn detect(
        &self,
        keyword: &str,
        text: &str,
        roster: &[String],
    ) -> Result<Detection, DetectionError>;
}

#[async_trait]
impl MentionDetector for LexicalDetector {
    async fn detect(
        &self,
        _keyword: &str,
        text: &str,
        roster: &[String],
    ) -> Result<Detection, DetectionError> {
        Ok(Detection {
            mentions: self.detect_mentions(text, roster)?,
            method: DetectionMethod::Fallback,
            category_relevance: None,
            new_brands_found: Vec::new(),
        })
    }
}

/// Runs the primary detector when it is available and falls back to
/// word-boundary matching when it is not, or when it fails.
pub struct BrandDetector {
    primary: Option<Arc<dyn MentionDetector>>,
    fallback: LexicalDetector,
    min_text_chars: usize,
}

impl BrandDetector {
    #[must_use]
    pub fn new(primary: Arc<dyn MentionDetector>) -> Self {
        Self {
            primary: Some(primary),
            fallback: LexicalDetector::new(),
            min_text_chars: MIN_DETECTABLE_CHARS,
        }
    }

    /// A detector that only ever uses word-boundary matching.
    #[must_use]
    pub fn lexical_only() -> Self {
        Self {
            primary: None,
            fallback: LexicalDetector::new(),
            min_text_chars: MIN_DETECTABLE_CHARS,
        }
    }

    #[must_use]
    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    /// Detects mentions on one page.
    ///
    /// Text shorter than the minimum yields [`Detection::skipped`] without
    /// consulting either strategy.
    ///
    /// # Errors
    ///
    /// Returns the fallback's [`DetectionError`] only when both strategies
    /// fail.
    pub async fn detect(
        &self,
        keyword: &str,
        text: &str,
        roster: &[String],
    ) -> Result<Detection, DetectionError> {
        if text.chars().count() < self.min_text_chars {
            return Ok(Detection::skipped());
        }

        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            match primary.detect(keyword, text, roster).await {
                Ok(detection) => return Ok(detection),
                Err(e) => {
                    tracing::warn!(
                        keyword,
                        error = %e,
                        "primary detection failed; using word matching"
                    );
                }
            }
        }

        self.fallback.detect(keyword, text, roster).await
    }
}
