//! The issue-finding pipeline.
//!
//! A run is strictly sequential:
//!
//! 1. **Janitor** - delete published records whose issue closed upstream
//! 2. For each category:
//!    - **Hunter** - list open issues per repo, drop pull requests, classify,
//!      keep issues at or above the confidence threshold
//!    - **Selector** - best-first, capped at the judge batch limit
//!    - **Publisher** - ask the judge, upsert what it accepts
//!
//! Dry-run mode skips the janitor and replaces every upsert with a log line.
//!
//! The **Catalog** is the read side: published issues per category.

pub mod catalog;
pub mod engine;
pub mod hunter;
pub mod janitor;
pub mod publisher;
pub mod report;
pub mod selector;

pub use catalog::{Catalog, FALLBACK_LIMIT, Listing};
pub use engine::{Engine, ScanReport, Services};
pub use hunter::Hunter;
pub use janitor::Janitor;
pub use publisher::{PublishOutcome, Publisher};
pub use report::{CategoryReport, HuntReport, JanitorReport, PublishReport, RunReport, SweepStatus};
pub use selector::select;
