//! Selector: keeps the best candidates of a category for the judge.

use crate::domain::Candidate;

/// Sort by score, highest first, and keep at most `limit` candidates.
///
/// The sort is stable, so candidates with equal scores keep their discovery
/// order.
pub fn select(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));
    candidates.truncate(limit);
    candidates
}
