use super::{generate_session_id, SessionStore};
use crate::types::{AppError, PrincipalId, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct SessionEntry {
    principal: PrincipalId,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process session store.
///
/// Expired entries are skipped on read and purged on the next write.
/// `create_exclusive` holds the write lock across check and insert, so at most
/// one live session per principal can be created through it.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Empty store whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// True when no live session remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_locked(
        &self,
        sessions: &mut HashMap<String, SessionEntry>,
        principal: &PrincipalId,
    ) -> Result<String> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| AppError::Internal("session ttl out of range".to_string()))?;
        sessions.retain(|_, entry| entry.is_live(now));

        let session_id = generate_session_id();
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                principal: principal.clone(),
                expires_at,
            },
        );
        Ok(session_id)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, principal: &PrincipalId) -> Result<String> {
        let mut sessions = self.sessions.write();
        let session_id = self.insert_locked(&mut sessions, principal)?;
        tracing::debug!(principal = %principal, "session created");
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<PrincipalId> {
        let now = Instant::now();
        self.sessions
            .read()
            .get(session_id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.principal.clone())
            .ok_or(AppError::SessionNotFound)
    }

    async fn find_by_principal(&self, principal: &PrincipalId) -> Result<String> {
        let now = Instant::now();
        self.sessions
            .read()
            .iter()
            .find(|(_, entry)| entry.is_live(now) && &entry.principal == principal)
            .map(|(id, _)| id.clone())
            .ok_or(AppError::SessionNotFound)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }

    async fn create_exclusive(&self, principal: &PrincipalId) -> Result<String> {
        let mut sessions = self.sessions.write();
        let now = Instant::now();

        if sessions
            .values()
            .any(|entry| entry.is_live(now) && &entry.principal == principal)
        {
            return Err(AppError::SessionAlreadyExists);
        }

        let session_id = self.insert_locked(&mut sessions, principal)?;
        tracing::debug!(principal = %principal, "session created");
        Ok(session_id)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
