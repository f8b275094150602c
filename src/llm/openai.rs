use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GatewayError, LlmGateway};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiGateway {
    api_key: String,
    model: String,
    max_tokens: usize,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiGateway {
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
impl LlmGateway for OpenAiGateway {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let send = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
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
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Call(format!("malformed API response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GatewayError::Call("response carried no choices".to_string()))
    }
}
