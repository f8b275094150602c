use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    /// Base URL for the API (optional, for proxies or test servers)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-call timeout enforced at the gateway boundary, in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    OpenAI,
    /// Deterministic in-process gateway, for development without an API key
    Scripted,
}

fn default_llm_timeout() -> u64 {
    30
}

/// Policy constants for the pipeline and interview protocol.
///
/// These bounds have no documented rationale beyond observed behavior; they
/// are kept as named, overridable configuration rather than hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum validation-driven regenerations per run
    #[serde(default = "default_retry_cap")]
    pub retry_cap: u32,

    /// Answer batches averaging below this score trigger follow-ups
    #[serde(default = "default_followup_threshold")]
    pub followup_threshold: f32,

    /// Follow-up rounds allowed within one interview stage
    #[serde(default = "default_max_followups")]
    pub max_followups_per_stage: u32,

    /// Hard cap on total interview rounds across all stages
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Total non-answers before the session is terminated
    #[serde(default = "default_invalid_limit")]
    pub invalid_limit: u32,

    /// Consecutive invalid batches before the session is terminated
    #[serde(default = "default_consecutive_invalid_limit")]
    pub consecutive_invalid_limit: u32,

    /// Minutes an idle interview session survives before sweep eviction
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,

    /// Concurrent LLM calls allowed across all runs
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
}

fn default_retry_cap() -> u32 {
    2
}

fn default_followup_threshold() -> f32 {
    0.6
}

fn default_max_followups() -> u32 {
    2
}

fn default_max_rounds() -> u32 {
    9
}

fn default_invalid_limit() -> u32 {
    5
}

fn default_consecutive_invalid_limit() -> u32 {
    3
}

fn default_session_ttl_minutes() -> u64 {
    30
}

fn default_worker_pool_size() -> usize {
    2
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            retry_cap: default_retry_cap(),
            followup_threshold: default_followup_threshold(),
            max_followups_per_stage: default_max_followups(),
            max_rounds: default_max_rounds(),
            invalid_limit: default_invalid_limit(),
            consecutive_invalid_limit: default_consecutive_invalid_limit(),
            session_ttl_minutes: default_session_ttl_minutes(),
            worker_pool_size: default_worker_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token callers must present; unset admits all callers (dev mode)
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Enable the optional web-search stage ahead of generation
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the search endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("learnpath").join("config.toml"))
    }

    /// Get the effective API key for the configured provider
    pub fn get_api_key(&self) -> Result<String> {
        self.llm
            .api_key
            .clone()
            .context("No API key configured for the LLM provider")
    }
}

impl Default for Config {
    fn default() -> Self {
        // Try to detect provider from environment variables
        let (provider, api_key, model) = if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            (
                LlmProvider::Anthropic,
                Some(key),
                "claude-sonnet-4-20250514".to_string(),
            )
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            (LlmProvider::OpenAI, Some(key), "gpt-4o".to_string())
        } else {
            (LlmProvider::Scripted, None, "scripted".to_string())
        };

        Self {
            llm: LlmConfig {
                provider,
                api_key,
                model,
                max_tokens: 4096,
                base_url: None,
                timeout_secs: default_llm_timeout(),
            },
            policy: PolicyConfig::default(),
            auth: AuthConfig::default(),
            search: SearchConfig::default(),
        }
    }
}
