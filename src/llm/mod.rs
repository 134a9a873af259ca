//! LLM Client Layer - chat-completion API integration with model fallback
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - GroqClient implementation
//! - FallbackPolicy for walking an ordered model list

pub mod client;
pub mod fallback;
pub mod groq;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient, MockReply};
pub use fallback::{Attempted, Exhausted, FallbackDecision, FallbackPolicy, ModelFailure};
pub use groq::{GROQ_API_KEY_ENV, GROQ_API_URL, GroqClient, GroqConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, ResponseFormat, Role, Usage};
