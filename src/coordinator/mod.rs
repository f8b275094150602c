//! Streaming coordinator.
//!
//! Drives a pipeline run stage-by-stage on one sequential task per run,
//! forwarding stage events as ordered [`StreamEvent`]s with progress
//! accounting, then persists the final artifact and emits exactly one
//! terminal event. Blocking LLM work is funneled through the shared bounded
//! worker pool so independent runs can execute concurrently without
//! flooding the provider.
//!
//! There is no mid-run cancellation: an abandoned listener does not stop
//! in-flight work, which is why persistence is idempotent per run id.

pub mod events;
pub mod pool;

pub use events::{StreamEvent, StreamEventKind};
pub use pool::{PooledGateway, WorkerPool};

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::config::PolicyConfig;
use crate::llm::LlmGateway;
use crate::persistence::RoadmapDatabase;
use crate::pipeline::context::{GenerationContext, RunRequest};
use crate::pipeline::executor::{PipelineEvent, PipelineExecutor};
use crate::search::WebSearchProvider;

pub struct StreamingCoordinator {
    gateway: Arc<dyn LlmGateway>,
    search: Option<Arc<dyn WebSearchProvider>>,
    db: Arc<RoadmapDatabase>,
    policy: PolicyConfig,
}

impl StreamingCoordinator {
    /// `pool` is shared with every other consumer of the gateway so the
    /// provider sees one global concurrency bound
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        search: Option<Arc<dyn WebSearchProvider>>,
        db: Arc<RoadmapDatabase>,
        policy: PolicyConfig,
        pool: WorkerPool,
    ) -> Self {
        Self {
            gateway: Arc::new(PooledGateway::new(gateway, pool)),
            search,
            db,
            policy,
        }
    }

    /// Start one run on its own task; returns immediately. Progress events
    /// go to `events`; the stream terminates with exactly one `complete` or
    /// `error`. The caller supplies the run id so it can register an event
    /// channel before any event fires.
    pub fn spawn_run(
        &self,
        run_id: String,
        request: RunRequest,
        events: broadcast::Sender<StreamEvent>,
    ) {
        let gateway = Arc::clone(&self.gateway);
        let search = self.search.clone();
        let db = Arc::clone(&self.db);
        let retry_cap = self.policy.retry_cap;

        tokio::spawn(async move {
            drive_run(run_id, request, gateway, search, db, retry_cap, events).await;
        });
    }
}

async fn drive_run(
    run_id: String,
    request: RunRequest,
    gateway: Arc<dyn LlmGateway>,
    search: Option<Arc<dyn WebSearchProvider>>,
    db: Arc<RoadmapDatabase>,
    retry_cap: u32,
    events: broadcast::Sender<StreamEvent>,
) {
    // One step for the title, then a goal step and a weeks step per month
    let total_steps = 1 + 2 * request.duration_months;
    let topic = request.topic.clone();

    let _ = events.send(
        StreamEvent::new(StreamEventKind::Start, format!("Starting study plan for {}", topic))
            .with_progress(0),
    );

    let mut ctx = GenerationContext::new(run_id.clone(), request);

    let (stage_tx, mut stage_rx) = mpsc::unbounded_channel();
    let executor = PipelineExecutor::new(gateway, search, retry_cap, stage_tx);

    // Forward stage events while the executor works through the run
    let forward = events.clone();
    let forwarder = tokio::spawn(async move {
        let mut completed: u32 = 0;
        while let Some(event) = stage_rx.recv().await {
            let stream_event = match event {
                PipelineEvent::TitleReady { title, description } => {
                    completed += 1;
                    StreamEvent::new(
                        StreamEventKind::TitleReady,
                        format!("Plan titled \"{}\"", title),
                    )
                    .with_data(serde_json::json!({
                        "title": title,
                        "description": description,
                    }))
                    .with_progress(percent(completed, total_steps))
                }
                PipelineEvent::MonthReady { month_number, title } => {
                    completed += 1;
                    StreamEvent::new(
                        StreamEventKind::MonthReady,
                        format!("Month {} goal ready", month_number),
                    )
                    .with_data(serde_json::json!({
                        "month_number": month_number,
                        "title": title,
                    }))
                    .with_progress(percent(completed, total_steps))
                }
                PipelineEvent::WeeksReady { month_number } => {
                    completed += 1;
                    StreamEvent::new(
                        StreamEventKind::WeeksReady,
                        format!("Weekly and daily tasks for month {} ready", month_number),
                    )
                    .with_data(serde_json::json!({ "month_number": month_number }))
                    .with_progress(percent(completed, total_steps))
                }
                PipelineEvent::Warning { message } => {
                    StreamEvent::new(StreamEventKind::Warning, message)
                }
            };
            let _ = forward.send(stream_event);
        }
    });

    executor.run(&mut ctx).await;
    drop(executor);
    let _ = forwarder.await;

    // Persistence failure is the one hard error a run surfaces
    match db.save_roadmap(&ctx).await {
        Ok(roadmap_id) => {
            tracing::info!("run {} persisted as roadmap {}", run_id, roadmap_id);
            let _ = events.send(
                StreamEvent::new(StreamEventKind::Complete, "Study plan ready")
                    .with_data(serde_json::json!({ "roadmap_id": roadmap_id }))
                    .with_progress(100),
            );
        }
        Err(e) => {
            tracing::error!("run {} failed to persist: {:#}", run_id, e);
            let _ = events.send(StreamEvent::new(
                StreamEventKind::Error,
                format!("failed to save the plan: {}", e),
            ));
        }
    }
}

/// Progress never reports 100 before the terminal event
fn percent(completed: u32, total: u32) -> u8 {
    ((completed * 100 / total.max(1)) as u8).min(99)
}
