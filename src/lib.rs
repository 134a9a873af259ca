//! GitNova - an issue-finding pipeline
//!
//! GitNova scans configured open-source repositories for open issues, scores
//! them with a local zero-shot classifier, asks a remote LLM judge to confirm
//! the difficulty and write a solution guide, and publishes the accepted
//! issues to a store. A janitor removes published issues once they close
//! upstream.

pub mod classifier;
pub mod config;
pub mod domain;
pub mod error;
pub mod github;
pub mod judge;
pub mod llm;
pub mod pipeline;
pub mod store;
pub mod text;

pub use error::{GitnovaError, Result};
