//! thinkgrade-providers: LLM transport adapters.
//!
//! Implements the `LlmProvider` trait for the Anthropic Messages API and
//! OpenAI-compatible Chat Completions, plus a mock for tests.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_provider, resolve_env_vars, ProviderConfig};

/// Pull the vendor's `error.message` out of an error body, falling back to
/// the raw text.
pub(crate) fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_message_extracted() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#;
        assert_eq!(upstream_message(body), "max_tokens too large");
    }

    #[test]
    fn plain_body_kept() {
        assert_eq!(upstream_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(upstream_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }
}
