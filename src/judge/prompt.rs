//! Prompt for the difficulty-verification judge.

use crate::domain::Difficulty;
use crate::text::truncate_chars;

/// Body used when an issue has no description.
pub const EMPTY_BODY_PLACEHOLDER: &str = "No details provided.";

/// Everything the judge sees about one issue.
#[derive(Debug, Clone, Copy)]
pub struct IssueBrief<'a> {
    pub repo: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub initial_difficulty: Difficulty,
}

/// Build the judge prompt.
///
/// The body is replaced by [`EMPTY_BODY_PLACEHOLDER`] when blank and cut to
/// `max_body_chars` characters.
pub fn build_prompt(brief: &IssueBrief<'_>, max_body_chars: usize) -> String {
    let body = if brief.body.trim().is_empty() {
        EMPTY_BODY_PLACEHOLDER
    } else {
        truncate_chars(brief.body, max_body_chars)
    };

    let mut prompt = String::new();

    prompt.push_str(&format!("You are a senior maintainer of the repository {}.\n\n", brief.repo));

    prompt.push_str("## Task 1: Difficulty Verification\n\n");
    prompt.push_str(&format!(
        "Review the issue. Is '{}' an accurate difficulty?\n",
        brief.initial_difficulty
    ));
    prompt.push_str("- 'Novice': docs, typos, very simple UI tweaks.\n");
    prompt.push_str("- 'Apprentice': standard bug fixes, new features.\n");
    prompt.push_str("- 'Contributor': complex architecture, memory leaks, core logic.\n");
    prompt.push_str("- 'Reject': vague, spam, or no clear actionable task.\n\n");

    prompt.push_str("## Task 2: Solution Guide\n\n");
    prompt.push_str("- You MUST name specific file paths that likely need changes (e.g. `src/components/Button.tsx`).\n");
    prompt.push_str("- You MUST give a technical, step-by-step plan.\n\n");

    prompt.push_str("## Issue\n\n");
    prompt.push_str(&format!("Title: {}\n", brief.title));
    prompt.push_str(&format!("Body: {}\n\n", body));

    prompt.push_str("## Output\n\n");
    prompt.push_str("Respond with a single JSON object and nothing else:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"verified_difficulty\": \"Novice\" | \"Apprentice\" | \"Contributor\" | \"Reject\",\n");
    prompt.push_str("  \"reason\": \"1 sentence explanation\",\n");
    prompt.push_str(
        "  \"hint\": \"**🎯 Goal:** [One clear sentence]\\n\\n**📂 Likely Files:**\\n- `path/to/file1`\\n- `path/to/file2`\\n\\n**🛠️ Plan:**\\n1. [Step 1]\\n2. [Step 2]\"\n",
    );
    prompt.push_str("}\n");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief<'a>(body: &'a str) -> IssueBrief<'a> {
        IssueBrief {
            repo: "octo/demo",
            title: "Button misaligned on mobile",
            body,
            initial_difficulty: Difficulty::Apprentice,
        }
    }

    #[test]
    fn test_prompt_contains_issue_and_labels() {
        let prompt = build_prompt(&brief("The submit button overflows."), 6000);
        assert!(prompt.contains("octo/demo"));
        assert!(prompt.contains("Button misaligned on mobile"));
        assert!(prompt.contains("The submit button overflows."));
        assert!(prompt.contains("'Apprentice' an accurate"));
        for d in Difficulty::ALL {
            assert!(prompt.contains(&format!("\"{}\"", d)));
        }
        assert!(prompt.contains("verified_difficulty"));
        assert!(prompt.contains("Likely Files"));
    }

    #[test]
    fn test_empty_body_uses_placeholder() {
        let prompt = build_prompt(&brief("  \n"), 6000);
        assert!(prompt.contains(&format!("Body: {}", EMPTY_BODY_PLACEHOLDER)));
    }

    #[test]
    fn test_body_is_truncated() {
        let body = format!("{}{}", "a".repeat(10), "SECRET_TAIL");
        let prompt = build_prompt(&brief(&body), 10);
        assert!(prompt.contains(&"a".repeat(10)));
        assert!(!prompt.contains("SECRET_TAIL"));
    }
}
