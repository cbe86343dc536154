//! Brand-mention detection and narrative generation.
//!
//! [`BrandDetector`] picks between an inference-backed detector and the
//! deterministic word-boundary [`LexicalDetector`]; [`NarrativeWriter`]
//! produces the best-effort summary paragraph for a finished run.

pub mod ai;
pub mod detector;
pub mod error;
pub mod inference;
pub mod lexical;
pub mod narrative;

pub use ai::InferenceDetector;
pub use detector::{BrandDetector, Detection, MentionDetector, MIN_DETECTABLE_CHARS};
pub use error::{DetectionError, InferenceError};
pub use inference::{CompletionRequest, InferenceClient, OpenAiClient};
pub use lexical::LexicalDetector;
pub use narrative::{NarrativeInput, NarrativeWriter, FALLBACK_NARRATIVE};
