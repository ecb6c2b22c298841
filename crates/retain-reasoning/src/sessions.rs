//! SessionRegistry — concurrent access to independent sessions via DashMap.

use dashmap::DashMap;
use std::sync::Arc;

use retain_core::models::ReasoningSession;

/// Thread-safe registry of sessions keyed by id. Independent sessions may
/// run in parallel; there is no cross-session shared state.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, ReasoningSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session snapshot.
    pub fn upsert(&self, session: ReasoningSession) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Cloned snapshot of a session.
    pub fn get(&self, session_id: &str) -> Option<ReasoningSession> {
        self.sessions.get(session_id).map(|r| r.clone())
    }

    pub fn remove(&self, session_id: &str) -> Option<ReasoningSession> {
        self.sessions.remove(session_id).map(|(_, v)| v)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }
}
