//! Gateway configuration.
//!
//! Loaded from TOML, then overridden from the environment. Every value the
//! gateway needs at runtime (origin, credentials, limits, webhook
//! destination) comes from here rather than being compiled in.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use thinkgrade_core::engine::EngineConfig;
use thinkgrade_providers::{resolve_env_vars, ProviderConfig};

/// File name searched for in the current directory.
pub const CONFIG_FILE_NAME: &str = "thinkgrade.toml";

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Socket address to bind.
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            admission: AdmissionConfig::default(),
            llm: LlmConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

/// Origin allow-list and rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// The deployed front-end origin. Empty matches nothing.
    #[serde(default)]
    pub allowed_origin: String,
    /// Local development origin, always allowed when non-empty.
    #[serde(default = "default_dev_origin")]
    pub dev_origin: String,
    /// Requests allowed per client per window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            allowed_origin: String::new(),
            dev_origin: default_dev_origin(),
            rate_limit: default_rate_limit(),
            window_secs: default_window_secs(),
        }
    }
}

/// LLM provider and sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 0.0 for deterministic grading.
    #[serde(default)]
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system_prompt: None,
        }
    }
}

/// Chat webhook destination.
///
/// Note: Custom Debug impl masks the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default = "default_chatwork_url")]
    pub base_url: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            room_id: None,
            base_url: default_chatwork_url(),
        }
    }
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("room_id", &self.room_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}
fn default_dev_origin() -> String {
    "http://localhost:5173".to_string()
}
fn default_rate_limit() -> u32 {
    10
}
fn default_window_secs() -> u64 {
    60
}
fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_chatwork_url() -> String {
    "https://api.chatwork.com".to_string()
}

impl GatewayConfig {
    /// Apply environment overrides through `lookup`, then resolve `${VAR}`
    /// references in string values.
    ///
    /// Empty override values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(origin) = get("THINKGRADE_ALLOWED_ORIGIN") {
            self.admission.allowed_origin = origin;
        }
        if let Some(listen) = get("THINKGRADE_LISTEN") {
            self.listen = listen;
        }
        if let Some(model) = get("THINKGRADE_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = get(self.llm.provider.key_env_var()) {
            self.llm.provider.set_api_key(key);
        }
        if let Some(token) = get("CHATWORK_API_TOKEN") {
            self.notifier.api_token = Some(token);
        }
        if let Some(room) = get("CHATWORK_ROOM_ID") {
            self.notifier.room_id = Some(room);
        }

        self.admission.allowed_origin = resolve_env_vars(&self.admission.allowed_origin);
        self.llm.provider = self.llm.provider.resolved();
        self.notifier.api_token = self.notifier.api_token.as_deref().map(resolve_env_vars);
        self.notifier.room_id = self.notifier.room_id.as_deref().map(resolve_env_vars);
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `thinkgrade.toml` in the current directory
/// 2. `~/.config/thinkgrade/config.toml`
///
/// Environment variables override file values.
pub fn load_config_from(path: Option<&Path>) -> Result<GatewayConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => default_config_path(),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<GatewayConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config file");
            config
        }
        None => GatewayConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let global = std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("thinkgrade").join("config.toml"))?;
    global.exists().then_some(global)
}

/// Starter file written by `thinkgrade init`.
pub const STARTER_CONFIG: &str = r#"# thinkgrade gateway configuration

listen = "127.0.0.1:8787"

[admission]
# Front-end origin allowed to call the gateway.
allowed_origin = "https://thinkgrade.example.com"
dev_origin = "http://localhost:5173"
rate_limit = 10
window_secs = 60

[llm]
model = "claude-sonnet-4-5-20250929"
max_tokens = 1024
temperature = 0.0

[llm.provider]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

# [llm.provider]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"

[notifier]
api_token = "${CHATWORK_API_TOKEN}"
room_id = "${CHATWORK_ROOM_ID}"
"#;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen, "127.0.0.1:8787");
        assert_eq!(config.admission.rate_limit, 10);
        assert_eq!(config.admission.window_secs, 60);
        assert_eq!(config.admission.dev_origin, "http://localhost:5173");
        assert!(config.admission.allowed_origin.is_empty());
        assert_eq!(config.llm.model, "claude-sonnet-4-5-20250929");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.notifier.base_url, "https://api.chatwork.com");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listen, "127.0.0.1:8787");
        assert_eq!(config.llm.provider.kind(), "anthropic");
    }

    #[test]
    fn starter_config_parses() {
        let mut config: GatewayConfig = toml::from_str(STARTER_CONFIG).unwrap();
        config.apply_overrides(env(&[("ANTHROPIC_API_KEY", "sk-from-env")]));
        assert_eq!(config.admission.allowed_origin, "https://thinkgrade.example.com");
        assert_eq!(config.llm.provider.api_key(), "sk-from-env");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: GatewayConfig = toml::from_str(
            r#"
listen = "0.0.0.0:9000"

[admission]
allowed_origin = "https://a.example"

[llm.provider]
type = "openai"
api_key = "sk-file"
"#,
        )
        .unwrap();

        config.apply_overrides(env(&[
            ("THINKGRADE_ALLOWED_ORIGIN", "https://b.example"),
            ("OPENAI_API_KEY", "sk-env"),
            ("ANTHROPIC_API_KEY", "ignored"),
            ("THINKGRADE_MODEL", "gpt-4.1"),
            ("CHATWORK_API_TOKEN", "cw-token"),
            ("CHATWORK_ROOM_ID", "42"),
            ("THINKGRADE_LISTEN", ""),
        ]));

        assert_eq!(config.listen, "0.0.0.0:9000");
        assert_eq!(config.admission.allowed_origin, "https://b.example");
        assert_eq!(config.llm.provider.api_key(), "sk-env");
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.notifier.api_token.as_deref(), Some("cw-token"));
        assert_eq!(config.notifier.room_id.as_deref(), Some("42"));
    }

    #[test]
    fn debug_never_prints_secrets() {
        let mut config = GatewayConfig::default();
        config.llm.provider.set_api_key("sk-secret-1".into());
        config.notifier.api_token = Some("cw-secret-2".into());

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret-1"));
        assert!(!rendered.contains("cw-secret-2"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            "[admission]\nrate_limit = 3\nwindow_secs = 5\n\n[llm]\nmax_tokens = 256\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.admission.rate_limit, 3);
        assert_eq!(config.admission.window_secs, 5);
        assert_eq!(config.llm.engine_config().max_tokens, 256);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
