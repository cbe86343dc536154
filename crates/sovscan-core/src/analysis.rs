//! Caller-supplied configuration for a single analysis run.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_TARGET_BRAND: &str = "Atomberg";
pub const DEFAULT_MAX_RESULTS: u32 = 10;

const MIN_KEYWORD_CHARS: usize = 2;
const MIN_RESULTS: u32 = 5;
const MAX_RESULTS: u32 = 50;

/// What to analyze: one keyword, how many search results to examine, and the
/// brand whose share of voice the caller cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub keyword: String,
    pub max_results: u32,
    pub target_brand: String,
    /// Informational only; carried through to the report.
    pub category: Option<String>,
}

impl AnalysisConfig {
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            max_results: DEFAULT_MAX_RESULTS,
            target_brand: DEFAULT_TARGET_BRAND.to_string(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_target_brand(mut self, target_brand: impl Into<String>) -> Self {
        self.target_brand = target_brand.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The keyword with surrounding whitespace removed.
    #[must_use]
    pub fn keyword(&self) -> &str {
        self.keyword.trim()
    }

    /// The target brand with surrounding whitespace removed.
    #[must_use]
    pub fn target_brand(&self) -> &str {
        self.target_brand.trim()
    }

    /// Check every field and report all violations together.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing each violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.keyword().chars().count() < MIN_KEYWORD_CHARS {
            errors.push(format!(
                "keyword must be at least {MIN_KEYWORD_CHARS} characters long"
            ));
        }

        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.max_results) {
            errors.push(format!(
                "max results must be between {MIN_RESULTS} and {MAX_RESULTS} (got {})",
                self.max_results
            ));
        }

        if self.target_brand().is_empty() {
            errors.push("target brand must be non-empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(cfg: &AnalysisConfig) -> Vec<String> {
        match cfg.validate() {
            Err(ConfigError::Invalid(v)) => v,
            Ok(()) => Vec::new(),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AnalysisConfig::new("smart fan");
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.target_brand, "Atomberg");
        assert!(cfg.category.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn keyword_is_trimmed_before_length_check() {
        let cfg = AnalysisConfig::new("  a  ");
        let v = violations(&cfg);
        assert_eq!(v.len(), 1);
        assert!(v[0].contains("keyword"));
    }

    #[test]
    fn max_results_bounds_are_inclusive() {
        assert!(AnalysisConfig::new("fan").with_max_results(5).validate().is_ok());
        assert!(AnalysisConfig::new("fan").with_max_results(50).validate().is_ok());
        assert_eq!(
            violations(&AnalysisConfig::new("fan").with_max_results(4)).len(),
            1
        );
        assert_eq!(
            violations(&AnalysisConfig::new("fan").with_max_results(51)).len(),
            1
        );
    }

    #[test]
    fn all_violations_reported_together() {
        let cfg = AnalysisConfig::new("x")
            .with_max_results(0)
            .with_target_brand(" ");
        assert_eq!(violations(&cfg).len(), 3);
    }

    #[test]
    fn category_is_carried() {
        let cfg = AnalysisConfig::new("smart fan").with_category("Electronics");
        assert_eq!(cfg.category.as_deref(), Some("Electronics"));
    }
}
