//! Shared server state: the coordinator, interview service, session store,
//! persistence handle, and per-run event broadcast channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, RwLock};

use crate::auth::AuthGate;
use crate::config::Config;
use crate::coordinator::{PooledGateway, StreamEvent, StreamingCoordinator, WorkerPool};
use crate::interview::InterviewService;
use crate::llm::{self, LlmGateway};
use crate::persistence::RoadmapDatabase;
use crate::search::{HttpSearchProvider, WebSearchProvider};
use crate::store::SessionStore;

pub struct AppState {
    pub auth: AuthGate,
    pub coordinator: StreamingCoordinator,
    pub interviews: InterviewService,
    pub sessions: SessionStore,
    pub db: Arc<RoadmapDatabase>,

    /// Event broadcast channels per run
    pub event_channels: RwLock<HashMap<String, broadcast::Sender<StreamEvent>>>,
}

impl AppState {
    /// Build state from config, opening the default database
    pub async fn new(config: Config) -> Result<Self> {
        let gateway = llm::create_gateway(&config)?;
        let db = Arc::new(RoadmapDatabase::new().await?);
        Ok(Self::with_parts(config, gateway, db))
    }

    /// Build state from pre-constructed collaborators (used by tests)
    pub fn with_parts(
        config: Config,
        gateway: Arc<dyn LlmGateway>,
        db: Arc<RoadmapDatabase>,
    ) -> Self {
        let search: Option<Arc<dyn WebSearchProvider>> = if config.search.enabled {
            config
                .search
                .base_url
                .clone()
                .map(|url| Arc::new(HttpSearchProvider::new(url)) as Arc<dyn WebSearchProvider>)
        } else {
            None
        };

        // One pool bounds LLM concurrency across pipeline and interview runs
        let pool = WorkerPool::new(config.policy.worker_pool_size);
        let coordinator = StreamingCoordinator::new(
            Arc::clone(&gateway),
            search,
            Arc::clone(&db),
            config.policy.clone(),
            pool.clone(),
        );
        let interview_gateway: Arc<dyn LlmGateway> =
            Arc::new(PooledGateway::new(gateway, pool));
        let interviews = InterviewService::new(interview_gateway, config.policy.clone());
        let sessions = SessionStore::new(Duration::from_secs(
            config.policy.session_ttl_minutes * 60,
        ));

        Self {
            auth: AuthGate::new(config.auth.token.clone()),
            coordinator,
            interviews,
            sessions,
            db,
            event_channels: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the event channel for a run
    pub async fn get_event_sender(&self, run_id: &str) -> broadcast::Sender<StreamEvent> {
        let mut channels = self.event_channels.write().await;

        if let Some(sender) = channels.get(run_id) {
            sender.clone()
        } else {
            let (sender, _) = broadcast::channel(1024);
            channels.insert(run_id.to_string(), sender.clone());
            sender
        }
    }

    /// Subscribe to a run's events
    pub async fn subscribe_events(&self, run_id: &str) -> broadcast::Receiver<StreamEvent> {
        let sender = self.get_event_sender(run_id).await;
        sender.subscribe()
    }
}
