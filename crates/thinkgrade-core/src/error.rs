//! Error types shared across thinkgrade crates.
//!
//! Provider errors live here rather than in `thinkgrade-providers` so the
//! evaluation engine and the gateway can downcast and classify them without
//! string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider credential is not configured.
    #[error("{0} is not configured")]
    MissingCredential(String),

    /// The API returned a non-success response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if the failure is a local configuration problem rather
    /// than something the upstream did.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::MissingCredential(_))
    }

    /// The upstream HTTP status, when one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProviderError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reasons an LLM reply could not be turned into [`Feedback`](crate::model::Feedback).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("no JSON object found in model reply")]
    NoJsonObject,

    #[error("failed to parse evaluation JSON: {0}")]
    Parse(String),

    #[error("invalid evaluation structure: {0}")]
    InvalidStructure(String),
}

/// Failure of one evaluation (prompt → provider → validation).
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The transport adapter failed; carries the adapter's error.
    #[error(transparent)]
    Provider(anyhow::Error),

    /// The reply arrived but did not contain a usable evaluation.
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
}

impl EvaluationError {
    /// The typed provider error, if the adapter produced one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            EvaluationError::Provider(e) => e.downcast_ref::<ProviderError>(),
            EvaluationError::Feedback(_) => None,
        }
    }
}

/// Rejected learner-session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("exercise index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("an evaluation is already in flight for {0}")]
    AlreadyEvaluating(String),

    #[error("no evaluation in flight for {0}")]
    NotEvaluating(String),

    #[error("answer for {0} is locked; revise it first")]
    Locked(String),

    #[error("answer for {0} scored 4 or above and is final")]
    Final(String),

    #[error("revision not available for {0}")]
    ReviseUnavailable(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("store error: {0}")]
    Store(String),
}
