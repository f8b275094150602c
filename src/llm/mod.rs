//! LLM gateway abstraction
//!
//! All free-text generation goes through the [`LlmGateway`] trait so the
//! pipeline and interview logic never depend on a concrete provider. The
//! gateway reports failures as values instead of panicking, distinguishes a
//! failed call from an unparseable response, and enforces the per-call
//! timeout. Retry policy does NOT live here; retries are a pipeline concern.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, LlmProvider};

pub mod anthropic;
pub mod openai;
pub mod scripted;

/// Failure kinds surfaced across the gateway boundary.
///
/// `Call` covers network errors, timeouts and non-success statuses; `Parse`
/// covers responses that arrived but could not be interpreted as the
/// requested structure. Stages treat both as a signal to fall back, but the
/// distinction matters for logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway call failed: {0}")]
    Call(String),

    #[error("structured response did not parse: {0}")]
    Parse(String),
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate free text for a prompt at the given sampling temperature
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError>;

    /// Generate and parse a JSON value, stripping fenced-code markers first
    async fn invoke_structured(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<serde_json::Value, GatewayError> {
        let text = self.invoke(prompt, temperature).await?;
        parse_structured(&text)
    }
}

/// Strip leading/trailing fenced-code-block markers, with or without a
/// language tag, leaving other content untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the opening fence line (which may carry a language tag)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse a gateway response as JSON after fence stripping
pub fn parse_structured(text: &str) -> Result<serde_json::Value, GatewayError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(120).collect();
        GatewayError::Parse(format!("{} (response began: {})", e, preview))
    })
}

/// Create the configured gateway
pub fn create_gateway(config: &Config) -> Result<Arc<dyn LlmGateway>> {
    match config.llm.provider {
        LlmProvider::Anthropic => {
            let api_key = config.get_api_key()?;
            tracing::info!("Using Anthropic gateway (model {})", config.llm.model);
            Ok(Arc::new(anthropic::AnthropicGateway::new(
                api_key,
                config.llm.model.clone(),
                config.llm.max_tokens,
                config.llm.base_url.clone(),
                config.llm.timeout_secs,
            )))
        }
        LlmProvider::OpenAI => {
            let api_key = config.get_api_key()?;
            tracing::info!("Using OpenAI gateway (model {})", config.llm.model);
            Ok(Arc::new(openai::OpenAiGateway::new(
                api_key,
                config.llm.model.clone(),
                config.llm.max_tokens,
                config.llm.base_url.clone(),
                config.llm.timeout_secs,
            )))
        }
        LlmProvider::Scripted => {
            tracing::warn!("Using scripted gateway; generated plans are canned");
            Ok(Arc::new(scripted::ScriptedGateway::new()))
        }
    }
}
