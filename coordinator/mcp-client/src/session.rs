/// In-memory session store
/// Sessions live for the lifetime of the process unless an idle sweep evicts them

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{CoordinatorError, Result};
use crate::event::QueryEvent;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(app_name: &str, user_id: &str, session_id: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Conversation history plus the key/value state written by earlier turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub events: Vec<QueryEvent>,
    pub state: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            events: Vec::new(),
            state: Map::new(),
            created_at: now,
            last_update_time: now,
        }
    }

    /// Appends an event, stamping its sequence and applying its state delta.
    pub fn append(&mut self, mut event: QueryEvent) -> QueryEvent {
        event.sequence = self.events.len() as u64;
        for (key, value) in &event.state_delta {
            self.state.insert(key.clone(), value.clone());
        }
        self.last_update_time = Utc::now();
        self.events.push(event.clone());
        event
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Owned, injectable session store
///
/// The map lock is only held to find or insert a handle. Each session has its
/// own lock, held by a turn while it runs, so unrelated sessions never wait
/// on each other.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, SessionHandle>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty session under `key` unless one exists; returns the session id.
    pub fn get_or_create(&self, key: &SessionKey) -> Result<String> {
        self.handle_or_create(key)?;
        Ok(key.session_id.clone())
    }

    pub(crate) fn handle_or_create(&self, key: &SessionKey) -> Result<SessionHandle> {
        if let Some(handle) = self.read()?.get(key) {
            return Ok(handle.clone());
        }

        let mut sessions = self.write()?;
        let handle = sessions.entry(key.clone()).or_insert_with(|| {
            tracing::info!(
                "[SESSION] Creating session {} for user {} ({})",
                key.session_id,
                key.user_id,
                key.app_name
            );
            Arc::new(Mutex::new(Session::new(key.clone())))
        });
        Ok(handle.clone())
    }

    pub fn handle(&self, key: &SessionKey) -> Result<Option<SessionHandle>> {
        Ok(self.read()?.get(key).cloned())
    }

    /// Snapshot of a session; waits for a running turn on it to finish.
    pub async fn get(&self, key: &SessionKey) -> Result<Option<Session>> {
        let handle = match self.handle(key)? {
            Some(handle) => handle,
            None => return Ok(None),
        };
        let session = handle.lock().await;
        Ok(Some(session.clone()))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes sessions idle for longer than `ttl`.
    ///
    /// Sessions in the middle of a turn are kept, as are sessions whose handle
    /// is held outside the store (an open WebSocket connection pins its session).
    pub fn evict_idle(&self, ttl: Duration) -> Result<usize> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CoordinatorError::Session(format!("invalid ttl: {}", e)))?;
        let cutoff = Utc::now() - ttl;

        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => session.last_update_time > cutoff,
                Err(_) => true,
            }
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!("[SESSION] Evicted {} idle sessions", evicted);
        }
        Ok(evicted)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SessionKey, SessionHandle>>> {
        self.sessions
            .read()
            .map_err(|e| CoordinatorError::Session(format!("Lock error: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SessionKey, SessionHandle>>> {
        self.sessions
            .write()
            .map_err(|e| CoordinatorError::Session(format!("Lock error: {}", e)))
    }
}

/// Periodically evicts idle sessions until the store is dropped
pub fn spawn_idle_sweeper(store: Arc<SessionStore>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    let weak = Arc::downgrade(&store);
    drop(store);
    let period = (ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(store) = weak.upgrade() else { break };
            if let Err(e) = store.evict_idle(ttl) {
                tracing::warn!("[SESSION] Idle sweep failed: {}", e);
            }
        }
    })
}
