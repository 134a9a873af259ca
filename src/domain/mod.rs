//! Domain types for gitnova
//!
//! This module contains all core domain types:
//! - Difficulty: The four-way difficulty scale shared by classifier and judge
//! - RawIssue / Candidate: Issues as fetched, and issues that survived the local filter
//! - LocalAnalysis: The local classifier's estimate
//! - Verdict: The judge's structured answer
//! - PublishedIssueRecord: The persisted row

pub mod difficulty;
pub mod issue;
pub mod record;
pub mod verdict;

pub use difficulty::Difficulty;
pub use issue::{Candidate, IssueState, LocalAnalysis, RawIssue};
pub use record::{DEFAULT_HINT, IssueKey, IssueRef, IssueStatus, PublishedIssueRecord};
pub use verdict::{Verdict, VerdictError};
