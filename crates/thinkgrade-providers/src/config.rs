//! Provider configuration and factory.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use thinkgrade_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;

/// Configuration for the LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Anthropic {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Anthropic {
            api_key: String::new(),
            base_url: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &mask(api_key))
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Anthropic { api_key, base_url } => f
                .debug_struct("Anthropic")
                .field("api_key", &mask(api_key))
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "***"
    }
}

impl ProviderConfig {
    /// Provider name as used in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Anthropic { .. } => "anthropic",
            ProviderConfig::OpenAI { .. } => "openai",
        }
    }

    /// Environment variable that overrides this provider's key.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderConfig::Anthropic { .. } => "ANTHROPIC_API_KEY",
            ProviderConfig::OpenAI { .. } => "OPENAI_API_KEY",
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            ProviderConfig::Anthropic { api_key, .. } | ProviderConfig::OpenAI { api_key, .. } => {
                api_key
            }
        }
    }

    pub fn set_api_key(&mut self, key: String) {
        match self {
            ProviderConfig::Anthropic { api_key, .. } | ProviderConfig::OpenAI { api_key, .. } => {
                *api_key = key
            }
        }
    }

    /// Copy of this config with `${VAR}` references resolved.
    pub fn resolved(&self) -> ProviderConfig {
        match self {
            ProviderConfig::OpenAI {
                api_key,
                base_url,
                org_id,
            } => ProviderConfig::OpenAI {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
                org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
            },
            ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            },
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Create a provider instance from its configuration.
///
/// An empty API key is accepted; the adapter reports it on first use.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            Arc::new(AnthropicProvider::new(api_key, base_url.clone())?)
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?),
    };
    tracing::debug!(provider = provider.name(), "created LLM provider");
    Ok(provider)
}
