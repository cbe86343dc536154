//! Share-of-voice pipeline: aggregation and the run orchestrator.
//!
//! [`Orchestrator::run`] sequences search, fetch, detection, aggregation and
//! summarizing, streaming [`sovscan_core::ProgressEvent`]s to the caller and
//! honouring a [`tokio_util::sync::CancellationToken`].

pub mod aggregate;
pub mod error;
pub mod orchestrator;
pub mod progress;

pub use aggregate::{aggregate, round2, Aggregate};
pub use error::PipelineError;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use progress::ProgressReporter;
