//! Ordered progress stream for one run.

use sovscan_core::{ProgressEvent, Stage};
use tokio::sync::mpsc::UnboundedSender;

/// Sends [`ProgressEvent`]s to the caller, never letting `percent_complete`
/// go backwards. A closed receiver silently disables reporting.
pub struct ProgressReporter {
    sink: Option<UnboundedSender<ProgressEvent>>,
    last_percent: u8,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(sink: Option<UnboundedSender<ProgressEvent>>) -> Self {
        Self {
            sink,
            last_percent: 0,
        }
    }

    pub fn stage_started(&mut self, stage: Stage) {
        tracing::info!(stage = stage.index(), label = stage.label(), "stage started");
        self.emit(ProgressEvent::stage_started(stage));
    }

    pub fn within_stage(&mut self, stage: Stage, completed: usize, total: usize) {
        self.emit(ProgressEvent::within_stage(stage, completed, total));
    }

    fn emit(&mut self, mut event: ProgressEvent) {
        event.percent_complete = event.percent_complete.max(self.last_percent);
        self.last_percent = event.percent_complete;

        if let Some(sink) = &self.sink {
            if sink.send(event).is_err() {
                tracing::debug!("progress receiver dropped; no further events will be sent");
                self.sink = None;
            }
        }
    }
}
