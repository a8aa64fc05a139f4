//! Session registry.
//!
//! Maps session ids to the inbound side of each live SSE session. The
//! registry is the only state shared between the task that owns a session's
//! stream and the tasks that deliver posted messages to it.

use crate::error::McpError;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;

/// Handle to one session's inbound message queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    created_at: DateTime<Utc>,
    inbound: mpsc::Sender<Bytes>,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>, inbound: mpsc::Sender<Bytes>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            inbound,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Hand a raw message body to the session's protocol task.
    pub async fn deliver(&self, body: Bytes) -> Result<(), McpError> {
        self.inbound
            .send(body)
            .await
            .map_err(|_| McpError::SessionNotFound(self.id.clone()))
    }
}

/// Registry of live sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Fails if the id is already taken.
    pub fn insert(&self, handle: SessionHandle) -> Result<(), McpError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(handle.id()) {
            return Err(McpError::SessionExists(handle.id().to_string()));
        }
        sessions.insert(handle.id().to_string(), handle);
        Ok(())
    }

    /// Look up a session by id.
    pub fn lookup(&self, id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove a session. Removing an unknown id is a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Drop every session, ending their streams once in-flight work drains.
    pub fn close_all(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let count = sessions.len();
        sessions.clear();
        count
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
