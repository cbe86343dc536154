//! Deterministic word-boundary mention counting.
//!
//! Used whenever inference is unavailable or fails. Depends on nothing but
//! the page text and the roster, so identical inputs always produce
//! identical output.

use regex::{Regex, RegexBuilder};
use sovscan_core::BrandMention;

use crate::error::DetectionError;

/// Fixed confidence assigned to every lexical match.
pub const LEXICAL_CONFIDENCE: f64 = 0.8;

const MAX_CONTEXTS: usize = 3;
const CONTEXT_RADIUS_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalDetector;

impl LexicalDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Counts case-insensitive whole-word occurrences of each roster brand.
    ///
    /// Brands with zero matches are omitted. The result is ordered by mention
    /// count descending; equal counts keep roster order.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::Pattern`] if a brand name cannot be compiled
    /// into a pattern (only possible for pathologically long names).
    pub fn detect_mentions(
        &self,
        text: &str,
        roster: &[String],
    ) -> Result<Vec<BrandMention>, DetectionError> {
        let mut mentions = Vec::new();

        for brand in roster {
            let name = brand.trim();
            if name.is_empty() {
                continue;
            }
            let pattern = brand_pattern(name)?;

            let mut count = 0u32;
            let mut contexts = Vec::new();
            for m in pattern.find_iter(text) {
                count = count.saturating_add(1);
                if contexts.len() < MAX_CONTEXTS {
                    contexts.push(context_around(text, m.start(), m.end()));
                }
            }

            if count > 0 {
                mentions.push(BrandMention {
                    brand_name: name.to_string(),
                    mention_count: count,
                    confidence: LEXICAL_CONFIDENCE,
                    sample_contexts: contexts,
                });
            }
        }

        // Stable: ties stay in roster order.
        mentions.sort_by(|a, b| b.mention_count.cmp(&a.mention_count));
        Ok(mentions)
    }
}

fn brand_pattern(name: &str) -> Result<Regex, DetectionError> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(name)))
        .case_insensitive(true)
        .build()
        .map_err(|e| DetectionError::Pattern {
            brand: name.to_string(),
            source: e,
        })
}

/// Up to [`CONTEXT_RADIUS_CHARS`] characters either side of `start..end`,
/// cut on char boundaries and trimmed.
fn context_around(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS_CHARS - 1)
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_RADIUS_CHARS)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].trim().to_string()
}
