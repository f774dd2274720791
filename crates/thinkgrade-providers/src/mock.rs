//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use thinkgrade_core::error::ProviderError;
use thinkgrade_core::traits::{CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};

enum Reply {
    Text(String),
    Status { status: u16, message: String },
    MissingCredential,
}

/// A mock LLM provider for exercising the engine and the gateway without
/// real API calls.
pub struct MockProvider {
    reply: Reply,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self::with_reply(Reply::Text(response.to_string()))
    }

    /// Create a mock whose every call fails with an upstream HTTP status.
    pub fn failing(status: u16, message: &str) -> Self {
        Self::with_reply(Reply::Status {
            status,
            message: message.to_string(),
        })
    }

    /// Create a mock that behaves like an adapter with no API key.
    pub fn unconfigured() -> Self {
        Self::with_reply(Reply::MissingCredential)
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let content = match &self.reply {
            Reply::Text(text) => text.clone(),
            Reply::Status { status, message } => {
                return Err(ProviderError::ApiError {
                    status: *status,
                    message: message.clone(),
                }
                .into())
            }
            Reply::MissingCredential => {
                return Err(ProviderError::MissingCredential("MOCK_API_KEY".into()).into())
            }
        };

        // Rough estimate, four bytes per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".into(),
            prompt: "anything at all".into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response(r#"{"score": 5}"#);

        let response = provider.complete(&request()).await.unwrap();
        assert_eq!(response.content, r#"{"score": 5}"#);
        assert_eq!(response.model, "mock-model");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything at all");
    }

    #[tokio::test]
    async fn failing_reports_status() {
        let provider = MockProvider::failing(503, "unavailable");

        let err = provider.complete(&request()).await.unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.upstream_status(), Some(503));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn unconfigured_is_a_configuration_error() {
        let provider = MockProvider::unconfigured();

        let err = provider.complete(&request()).await.unwrap_err();
        assert!(err.downcast_ref::<ProviderError>().unwrap().is_configuration());
    }
}
