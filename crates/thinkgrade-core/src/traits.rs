//! Trait definitions at the crate seams.
//!
//! `LlmProvider` is implemented by the transport adapters in
//! `thinkgrade-providers`; `EvaluationBackend` is the learner session's view
//! of the gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{EvaluationRequest, Feedback};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that complete a prompt.
///
/// Adapters hide the vendor wire format so the evaluation flow never changes
/// when the vendor does.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send one prompt and return the raw reply text.
    ///
    /// Errors should be [`crate::error::ProviderError`] values so callers can
    /// downcast them.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;
}

/// One completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "claude-sonnet-4-5-20250929").
    pub model: String,
    /// The user message.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Reply to a [`CompletionRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The raw reply text.
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    /// Token usage, when the vendor reports it.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Evaluation backend trait
// ---------------------------------------------------------------------------

/// Anything that can score an answer for the learner session.
///
/// The error is a user-presentable message.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Feedback, String>;
}
