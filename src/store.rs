//! Ephemeral session store.
//!
//! A TTL-evicted map of in-flight interview sessions. Sessions hold only
//! transient editing state ahead of finalization, so the store is
//! deliberately non-durable. Eviction runs opportunistically whenever a new
//! session is inserted rather than on a background timer. Each entry wraps
//! its session in an `Arc<Mutex<..>>` so two requests racing on the same
//! session id serialize on the entry instead of losing updates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::interview::session::InterviewSession;

struct StoredSession {
    session: Arc<Mutex<InterviewSession>>,
    created_at: Instant,
}

pub struct SessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, StoredSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a session, sweeping expired entries first
    pub async fn insert(&self, session: InterviewSession) {
        let mut entries = self.entries.write().await;

        let ttl = self.ttl;
        entries.retain(|_, stored| stored.created_at.elapsed() < ttl);

        entries.insert(
            session.id.clone(),
            StoredSession {
                session: Arc::new(Mutex::new(session)),
                created_at: Instant::now(),
            },
        );
    }

    /// Look up a live session. Expired entries are unreachable once any
    /// insert has swept them; a lookup between sweeps also refuses them.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<InterviewSession>>> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|stored| stored.created_at.elapsed() < self.ttl)
            .map(|stored| Arc::clone(&stored.session))
    }

    pub async fn remove(&self, id: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(id);
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}
