//! Difficulty scale for issues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hard an issue is for a newcomer.
///
/// Serialized as the bare variant name ("Novice", "Apprentice", ...), which is
/// also the value stored in the `difficulty` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Docs, typos, very simple UI tweaks
    Novice,
    /// Standard bug fixes and features
    Apprentice,
    /// Architecture, memory leaks, core logic
    Contributor,
    /// Vague, spam, or not actionable
    Reject,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Novice,
        Difficulty::Apprentice,
        Difficulty::Contributor,
        Difficulty::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Novice => "Novice",
            Difficulty::Apprentice => "Apprentice",
            Difficulty::Contributor => "Contributor",
            Difficulty::Reject => "Reject",
        }
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Difficulty::Reject)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown difficulty: {}", s))
    }
}
