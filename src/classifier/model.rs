//! Zero-shot model abstraction and a rule-based mock.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{CANDIDATE_LABELS, label_for_difficulty};
use crate::domain::Difficulty;

/// Errors from the zero-shot model.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Inference API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Labels and their scores, as returned by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZeroShotOutput {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ZeroShotOutput {
    pub fn new(pairs: impl IntoIterator<Item = (impl Into<String>, f64)>) -> Self {
        let (labels, scores) = pairs.into_iter().map(|(l, s)| (l.into(), s)).unzip();
        Self { labels, scores }
    }

    /// Highest-scoring label; the earliest one wins a tie.
    pub fn top(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (label, score) in self.labels.iter().zip(self.scores.iter().copied()) {
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((label.as_str(), score));
            }
        }
        best
    }
}

/// A zero-shot text classifier: text plus candidate labels in, ranked labels out.
#[async_trait]
pub trait ZeroShotModel: Send + Sync {
    async fn classify(&self, text: &str, labels: &[&str]) -> Result<ZeroShotOutput, ClassifierError>;

    /// Model identifier, for logs
    fn name(&self) -> &str;
}

/// Deterministic stand-in for a real model.
///
/// The first rule whose needle occurs in the text decides the top label and
/// score; otherwise the fallback applies; with neither, the output is empty.
/// Texts containing a `failing_on` needle produce an inference error.
#[derive(Debug, Default)]
pub struct MockZeroShotModel {
    rules: Vec<(String, Difficulty, f64)>,
    fallback: Option<(Difficulty, f64)>,
    fail_on: Vec<String>,
    inputs: Mutex<Vec<String>>,
}

impl MockZeroShotModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, needle: impl Into<String>, difficulty: Difficulty, score: f64) -> Self {
        self.rules.push((needle.into(), difficulty, score));
        self
    }

    pub fn with_fallback(mut self, difficulty: Difficulty, score: f64) -> Self {
        self.fallback = Some((difficulty, score));
        self
    }

    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// Texts the model was asked to classify, in order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().map(|i| i.len()).unwrap_or(0)
    }

    fn output_for(difficulty: Difficulty, score: f64) -> ZeroShotOutput {
        let Some(top) = label_for_difficulty(difficulty) else {
            return ZeroShotOutput::default();
        };
        let rest = ((1.0 - score) / 2.0).min(score).max(0.0);
        let mut pairs = vec![(top, score)];
        pairs.extend(CANDIDATE_LABELS.iter().filter(|l| **l != top).map(|l| (*l, rest)));
        ZeroShotOutput::new(pairs)
    }
}

#[async_trait]
impl ZeroShotModel for MockZeroShotModel {
    async fn classify(&self, text: &str, _labels: &[&str]) -> Result<ZeroShotOutput, ClassifierError> {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(text.to_string());
        }

        if self.fail_on.iter().any(|n| text.contains(n.as_str())) {
            return Err(ClassifierError::Inference("mock failure".to_string()));
        }

        let decision = self
            .rules
            .iter()
            .find(|(needle, _, _)| text.contains(needle.as_str()))
            .map(|(_, d, s)| (*d, *s))
            .or(self.fallback);

        Ok(match decision {
            Some((difficulty, score)) => Self::output_for(difficulty, score),
            None => ZeroShotOutput::default(),
        })
    }

    fn name(&self) -> &str {
        "mock-zero-shot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{APPRENTICE_LABEL, NOVICE_LABEL};

    #[test]
    fn test_top_picks_highest() {
        let output = ZeroShotOutput::new([("a", 0.2), ("b", 0.7), ("c", 0.1)]);
        assert_eq!(output.top(), Some(("b", 0.7)));
    }

    #[test]
    fn test_top_tie_keeps_first() {
        let output = ZeroShotOutput::new([("a", 0.4), ("b", 0.4), ("c", 0.2)]);
        assert_eq!(output.top(), Some(("a", 0.4)));
    }

    #[test]
    fn test_top_empty() {
        assert_eq!(ZeroShotOutput::default().top(), None);
    }

    #[tokio::test]
    async fn test_mock_rules_and_fallback() {
        let model = MockZeroShotModel::new()
            .with_rule("typo", Difficulty::Novice, 0.8)
            .with_fallback(Difficulty::Apprentice, 0.6);

        let out = model.classify("a typo", &CANDIDATE_LABELS).await.unwrap();
        assert_eq!(out.top(), Some((NOVICE_LABEL, 0.8)));

        let out = model.classify("other", &CANDIDATE_LABELS).await.unwrap();
        assert_eq!(out.top(), Some((APPRENTICE_LABEL, 0.6)));

        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_low_score_stays_on_top() {
        let model = MockZeroShotModel::new().with_fallback(Difficulty::Novice, 0.2);
        let out = model.classify("x", &CANDIDATE_LABELS).await.unwrap();
        assert_eq!(out.top(), Some((NOVICE_LABEL, 0.2)));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let model = MockZeroShotModel::new().failing_on("explode");
        assert!(model.classify("explode now", &CANDIDATE_LABELS).await.is_err());
    }
}
