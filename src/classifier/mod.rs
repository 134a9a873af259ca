//! Local difficulty classifier.
//!
//! Wraps a zero-shot text classification model and maps its answer onto the
//! difficulty scale. The wrapper never fails: empty input and inference
//! errors come back as distinct [`ClassifierOutcome`] variants whose analysis
//! is `{Reject, 0.0}`.

pub mod huggingface;
pub mod model;

use std::sync::Arc;

use crate::domain::{Difficulty, LocalAnalysis};
use crate::text::truncate_chars;

pub use huggingface::{HuggingFaceConfig, HuggingFaceModel};
pub use model::{ClassifierError, MockZeroShotModel, ZeroShotModel, ZeroShotOutput};

pub const NOVICE_LABEL: &str = "easy documentation fix or typo correction";
pub const APPRENTICE_LABEL: &str = "standard feature implementation or bug fix";
pub const CONTRIBUTOR_LABEL: &str = "complex architectural change or core performance";

/// The three candidate labels, in Novice/Apprentice/Contributor order.
pub const CANDIDATE_LABELS: [&str; 3] = [NOVICE_LABEL, APPRENTICE_LABEL, CONTRIBUTOR_LABEL];

/// Default input cap, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1024;

/// Map a candidate label to its difficulty. Unknown labels count as Apprentice.
pub fn difficulty_for_label(label: &str) -> Difficulty {
    match label {
        NOVICE_LABEL => Difficulty::Novice,
        CONTRIBUTOR_LABEL => Difficulty::Contributor,
        _ => Difficulty::Apprentice,
    }
}

/// The candidate label for a difficulty (Reject has none).
pub fn label_for_difficulty(difficulty: Difficulty) -> Option<&'static str> {
    match difficulty {
        Difficulty::Novice => Some(NOVICE_LABEL),
        Difficulty::Apprentice => Some(APPRENTICE_LABEL),
        Difficulty::Contributor => Some(CONTRIBUTOR_LABEL),
        Difficulty::Reject => None,
    }
}

/// What the classifier made of one text.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutcome {
    /// The model produced a score.
    Scored(LocalAnalysis),
    /// Blank input; the model was not called.
    Empty,
    /// The model failed.
    Failed(String),
}

impl ClassifierOutcome {
    /// The analysis to use for this outcome; `{Reject, 0.0}` unless scored.
    pub fn analysis(&self) -> LocalAnalysis {
        match self {
            ClassifierOutcome::Scored(analysis) => *analysis,
            ClassifierOutcome::Empty | ClassifierOutcome::Failed(_) => LocalAnalysis::reject(),
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, ClassifierOutcome::Scored(_))
    }
}

/// Scores issue text against the three difficulty labels.
pub struct DifficultyClassifier {
    model: Arc<dyn ZeroShotModel>,
    max_input_chars: usize,
}

impl DifficultyClassifier {
    pub fn new(model: Arc<dyn ZeroShotModel>) -> Self {
        Self {
            model,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub async fn classify(&self, text: &str) -> ClassifierOutcome {
        if text.trim().is_empty() {
            return ClassifierOutcome::Empty;
        }

        let input = truncate_chars(text, self.max_input_chars);

        match self.model.classify(input, &CANDIDATE_LABELS).await {
            Ok(output) => match output.top() {
                Some((label, score)) => {
                    ClassifierOutcome::Scored(LocalAnalysis::new(difficulty_for_label(label), score))
                }
                None => {
                    log::error!("Inference error: model returned no labels");
                    ClassifierOutcome::Failed("model returned no labels".to_string())
                }
            },
            Err(e) => {
                log::error!("Inference error: {}", e);
                ClassifierOutcome::Failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for DifficultyClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifficultyClassifier")
            .field("model", &self.model.name())
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}
