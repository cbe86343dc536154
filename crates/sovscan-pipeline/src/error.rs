use sovscan_core::ConfigError;
use sovscan_search::SearchError;
use thiserror::Error;

/// Errors that abort a run. Per-page fetch and detection failures never
/// appear here; they are recorded on the report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid analysis configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("search stage failed: {0}")]
    Search(#[from] SearchError),

    #[error("an analysis run is already in progress")]
    AlreadyRunning,
}
