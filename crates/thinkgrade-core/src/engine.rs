//! Evaluation engine.
//!
//! Runs one answer through prompt building, the LLM provider and reply
//! validation. A single attempt per call: failures are reported, never
//! retried.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::EvaluationError;
use crate::model::{EvaluationRequest, Feedback};
use crate::parser::parse_feedback;
use crate::prompt::build_evaluation_prompt;
use crate::traits::{CompletionRequest, EvaluationBackend, LlmProvider};

/// Configuration for the evaluation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Output-length cap.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 for deterministic grading).
    pub temperature: f64,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            system_prompt: None,
        }
    }
}

/// Scores answers with an LLM.
pub struct EvaluationEngine {
    provider: Arc<dyn LlmProvider>,
    config: EngineConfig,
}

impl EvaluationEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Evaluate one answer.
    ///
    /// The caller is expected to have run [`EvaluationRequest::validate`].
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<Feedback, EvaluationError> {
        let start = Instant::now();
        let completion = CompletionRequest {
            model: self.config.model.clone(),
            prompt: build_evaluation_prompt(&request.exercise_id, &request.answer_text),
            system_prompt: self.config.system_prompt.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .provider
            .complete(&completion)
            .await
            .map_err(EvaluationError::Provider)?;

        let feedback = parse_feedback(&response.content).inspect_err(|e| {
            tracing::warn!(
                exercise_id = %request.exercise_id,
                reply_len = response.content.len(),
                "unusable model reply: {e}"
            );
        })?;

        tracing::debug!(
            exercise_id = %request.exercise_id,
            score = feedback.score,
            tokens = response.token_usage.total_tokens,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "evaluation complete"
        );
        Ok(feedback)
    }
}

#[async_trait]
impl EvaluationBackend for EvaluationEngine {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Feedback, String> {
        request.validate()?;
        EvaluationEngine::evaluate(self, request)
            .await
            .map_err(|e| format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{FeedbackError, ProviderError};
    use crate::traits::{CompletionResponse, TokenUsage};

    /// Provider returning a canned reply (or failure) and recording prompts.
    struct StubProvider {
        reply: Result<String, u16>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubProvider {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    token_usage: TokenUsage::default(),
                    latency_ms: 1,
                }),
                Err(status) => Err(ProviderError::ApiError {
                    status: *status,
                    message: "upstream exploded".into(),
                }
                .into()),
            }
        }
    }

    fn request() -> EvaluationRequest {
        EvaluationRequest::new("problem-2", "Root cause: too many handoffs between teams.")
    }

    #[tokio::test]
    async fn scores_answer_with_fixed_sampling() {
        let provider = Arc::new(StubProvider::replying(
            r#"Sure! {"score": 2, "strengths": ["a"], "improvements": ["b"], "suggestions": ["c"]}"#,
        ));
        let engine = EvaluationEngine::new(provider.clone(), EngineConfig::default());

        let fb = engine.evaluate(&request()).await.unwrap();
        assert_eq!(fb.score, 2);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].max_tokens, 1024);
        assert!(seen[0].prompt.contains("Framework: Logic tree"));
        assert!(seen[0].prompt.contains("too many handoffs"));
    }

    #[tokio::test]
    async fn upstream_failure_is_not_retried() {
        let provider = Arc::new(StubProvider::failing(503));
        let engine = EvaluationEngine::new(provider.clone(), EngineConfig::default());

        let err = engine.evaluate(&request()).await.unwrap_err();
        assert_eq!(err.provider_error().and_then(|e| e.upstream_status()), Some(503));
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn prose_only_reply_never_yields_default_feedback() {
        let provider = Arc::new(StubProvider::replying("This answer is quite good overall."));
        let engine = EvaluationEngine::new(provider, EngineConfig::default());

        let err = engine.evaluate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Feedback(FeedbackError::NoJsonObject)
        ));
    }

    #[tokio::test]
    async fn backend_impl_validates_input_first() {
        let provider = Arc::new(StubProvider::replying("unused"));
        let engine = EvaluationEngine::new(provider.clone(), EngineConfig::default());

        let err = EvaluationBackend::evaluate(&engine, &EvaluationRequest::new("problem-1", "short"))
            .await
            .unwrap_err();
        assert!(err.contains("too short"));
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
