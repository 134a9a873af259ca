//! The judge's structured answer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Difficulty;

#[derive(Debug, Error)]
pub enum VerdictError {
    #[error("verdict is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("verdict is empty")]
    Empty,
}

/// What the judge decided about one candidate.
///
/// Every field is optional: the judge may omit any of them, and the publisher
/// falls back to local values. An unknown difficulty string is a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(default)]
    pub verified_difficulty: Option<Difficulty>,

    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub hint: Option<String>,
}

impl Verdict {
    pub fn parse(content: &str) -> Result<Self, VerdictError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(VerdictError::Empty);
        }
        Ok(serde_json::from_str(content)?)
    }

    pub fn is_reject(&self) -> bool {
        self.verified_difficulty.is_some_and(|d| d.is_reject())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_verdict() {
        let verdict = Verdict::parse(
            r#"{"verified_difficulty":"Novice","reason":"Typo only","hint":"**Goal:** fix it"}"#,
        )
        .unwrap();
        assert_eq!(verdict.verified_difficulty, Some(Difficulty::Novice));
        assert_eq!(verdict.reason.as_deref(), Some("Typo only"));
        assert!(!verdict.is_reject());
    }

    #[test]
    fn test_parse_reject() {
        let verdict = Verdict::parse(r#"{"verified_difficulty":"Reject","reason":"Spam"}"#).unwrap();
        assert!(verdict.is_reject());
        assert!(verdict.hint.is_none());
    }

    #[test]
    fn test_parse_missing_fields() {
        let verdict = Verdict::parse("{}").unwrap();
        assert_eq!(verdict, Verdict::default());
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let verdict = Verdict::parse(r#"{"verified_difficulty":"Contributor","confidence":0.9}"#).unwrap();
        assert_eq!(verdict.verified_difficulty, Some(Difficulty::Contributor));
    }

    #[test]
    fn test_parse_unknown_difficulty_fails() {
        let result = Verdict::parse(r#"{"verified_difficulty":"Expert"}"#);
        assert!(matches!(result, Err(VerdictError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(Verdict::parse("Sure! Here is"), Err(VerdictError::InvalidJson(_))));
        assert!(matches!(Verdict::parse("   "), Err(VerdictError::Empty)));
    }
}
