//! Deterministic gateway double.
//!
//! Returns canned responses selected by substring match on the prompt,
//! falling back to a default response when no rule matches. Records call
//! count and the last prompt so tests can assert on gateway traffic. With no
//! rules and no default every call fails, which drives callers down their
//! fallback paths; that is also the behavior of the `scripted` provider in
//! dev mode.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{GatewayError, LlmGateway};

#[derive(Default)]
pub struct ScriptedGateway {
    rules: Vec<(String, String)>,
    default_response: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that fails every call, for exercising fallback paths
    pub fn failing() -> Self {
        Self::default()
    }

    /// Return `response` for any prompt containing `needle`.
    /// Rules are checked in registration order.
    pub fn respond_when(mut self, needle: &str, response: &str) -> Self {
        self.rules.push((needle.to_string(), response.to_string()));
        self
    }

    /// Response used when no rule matches
    pub fn with_default(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .expect("last_prompt lock poisoned")
            .clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn invoke(&self, prompt: &str, _temperature: f32) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_prompt
            .lock()
            .expect("last_prompt lock poisoned") = Some(prompt.to_string());

        for (needle, response) in &self.rules {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(GatewayError::Call(
                "no scripted response matched".to_string(),
            )),
        }
    }
}
