//! Bounded worker pool for blocking LLM work.
//!
//! Independent runs share one pool of permits so a burst of runs cannot
//! flood the provider; stages within a run stay strictly sequential because
//! each run's coordinating task awaits every call.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::llm::{GatewayError, LlmGateway};

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Gateway decorator that funnels every call through the pool
pub struct PooledGateway {
    inner: Arc<dyn LlmGateway>,
    pool: WorkerPool,
}

impl PooledGateway {
    pub fn new(inner: Arc<dyn LlmGateway>, pool: WorkerPool) -> Self {
        Self { inner, pool }
    }
}

#[async_trait]
impl LlmGateway for PooledGateway {
    async fn invoke(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError> {
        let _permit = self
            .pool
            .semaphore
            .acquire()
            .await
            .expect("worker pool semaphore closed");
        self.inner.invoke(prompt, temperature).await
    }

    async fn invoke_structured(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<serde_json::Value, GatewayError> {
        let _permit = self
            .pool
            .semaphore
            .acquire()
            .await
            .expect("worker pool semaphore closed");
        self.inner.invoke_structured(prompt, temperature).await
    }
}
