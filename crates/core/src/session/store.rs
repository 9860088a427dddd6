use crate::config::env_or;
use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

const DEFAULT_IDLE_TTL_SECS: u64 = 3600;

pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// In-memory registry of live sessions keyed by id.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn from_env() -> Self {
        Self::new(Duration::from_secs(env_or(
            "SESSION_IDLE_TTL_SECS",
            DEFAULT_IDLE_TTL_SECS,
        )))
    }

    /// Registers a fresh session, dropping sessions idle past the TTL.
    pub async fn create(&self) -> SessionHandle {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        let now = Instant::now();

        let mut guard = self.sessions.lock().await;
        let before = guard.len();
        guard.retain(|_, e| now.duration_since(e.last_seen) < self.idle_ttl);
        let pruned = before - guard.len();
        if pruned > 0 {
            tracing::info!(pruned, live = guard.len(), "pruned idle sessions");
        }

        guard.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(session_id = %id, "session created");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut guard = self.sessions.lock().await;
        let entry = guard.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_IDLE_TTL_SECS))
    }
}
