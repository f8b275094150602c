use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GatewayError, LlmGateway};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicGateway {
    api_key: String,
    model: String,
    max_tokens: usize,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicGateway {
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: usize,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let send = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                GatewayError::Call(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| GatewayError::Call(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Call(format!(
                "Anthropic API error ({}): {}",
                status, text
            )));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Call(format!("malformed API response: {}", e)))?;

        let text = body
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContent::Text { text } => Some(text.as_str()),
                AnthropicContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(GatewayError::Call("response carried no text".to_string()));
        }

        Ok(text)
    }
}
