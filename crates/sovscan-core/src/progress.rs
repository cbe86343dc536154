//! Pipeline stages and the progress events reported while moving through them.

use serde::{Deserialize, Serialize};

/// The fixed, ordered stages of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Searching,
    Fetching,
    Detecting,
    Aggregating,
    Summarizing,
    Finalizing,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Searching,
        Stage::Fetching,
        Stage::Detecting,
        Stage::Aggregating,
        Stage::Summarizing,
        Stage::Finalizing,
    ];

    /// 1-based position of the stage.
    #[must_use]
    pub fn index(self) -> u32 {
        match self {
            Stage::Searching => 1,
            Stage::Fetching => 2,
            Stage::Detecting => 3,
            Stage::Aggregating => 4,
            Stage::Summarizing => 5,
            Stage::Finalizing => 6,
        }
    }

    #[must_use]
    pub fn count() -> u32 {
        6
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::Searching => "Searching for top websites",
            Stage::Fetching => "Extracting website content",
            Stage::Detecting => "Analyzing brand mentions",
            Stage::Aggregating => "Calculating share of voice",
            Stage::Summarizing => "Generating analysis summary",
            Stage::Finalizing => "Finalizing results",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage_index: u32,
    pub stage_count: u32,
    pub stage_label: String,
    /// 0..=100, non-decreasing within a run.
    pub percent_complete: u8,
}

impl ProgressEvent {
    /// Event announcing entry into `stage`.
    #[must_use]
    pub fn stage_started(stage: Stage) -> Self {
        let percent = if stage == Stage::Finalizing {
            100
        } else {
            percent_complete(stage.index(), Stage::count(), 0.0)
        };
        Self {
            stage_index: stage.index(),
            stage_count: Stage::count(),
            stage_label: stage.label().to_string(),
            percent_complete: percent,
        }
    }

    /// Event for intra-stage work: `completed` of `total` items done.
    #[must_use]
    pub fn within_stage(stage: Stage, completed: usize, total: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let fraction = if total == 0 {
            1.0
        } else {
            completed as f64 / total as f64
        };
        Self {
            stage_index: stage.index(),
            stage_count: Stage::count(),
            stage_label: format!("{} ({completed}/{total})", stage.label()),
            percent_complete: percent_complete(stage.index(), Stage::count(), fraction),
        }
    }
}

/// `round(((stage_index - 1) + fraction) / stage_count * 100)`, clamped to 0..=100.
///
/// `fraction` is clamped to `[0.0, 1.0]` first so a stage can never report
/// progress beyond the start of the next one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent_complete(stage_index: u32, stage_count: u32, fraction: f64) -> u8 {
    if stage_count == 0 {
        return 100;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let done = f64::from(stage_index.saturating_sub(1)) + fraction;
    let pct = (done / f64::from(stage_count) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
