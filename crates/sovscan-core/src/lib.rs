//! Shared domain model and configuration for the share-of-voice pipeline.
//!
//! Every other `sovscan-*` crate depends on this one for the run-scoped data
//! types (`SearchHit` through `AnalysisReport`), the caller-facing
//! `AnalysisConfig`, environment-driven `AppConfig`, and the brand roster.

pub mod analysis;
pub mod app_config;
pub mod brands;
pub mod config;
pub mod error;
pub mod progress;
pub mod types;

pub use analysis::{AnalysisConfig, DEFAULT_MAX_RESULTS, DEFAULT_TARGET_BRAND};
pub use app_config::AppConfig;
pub use brands::{load_roster, BrandRoster, DEFAULT_BRANDS};
pub use config::{
    brands_path_from_env, load_app_config_from_env, load_dotenv, log_level_from_env,
};
pub use error::ConfigError;
pub use progress::{percent_complete, ProgressEvent, Stage};
pub use types::{
    AnalysisReport, BrandMention, BrandTotal, DetectionMethod, FetchResult, FetchStats,
    PageAnalysis, SearchHit,
};
