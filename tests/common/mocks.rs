//! Test doubles shared by the integration tests.

use async_trait::async_trait;
use authgate::session::{MemorySessionStore, SessionStore};
use authgate::types::{PrincipalId, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Session store that forwards to [`MemorySessionStore`] and counts calls.
///
/// Lets tests assert that a code path never reached the store.
pub struct CountingSessionStore {
    inner: MemorySessionStore,
    pub creates: AtomicUsize,
    pub gets: AtomicUsize,
    pub finds: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: MemorySessionStore::new(ttl),
            creates: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.gets.load(Ordering::SeqCst)
            + self.finds.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl SessionStore for CountingSessionStore {
    async fn create(&self, principal: &PrincipalId) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(principal).await
    }

    async fn get(&self, session_id: &str) -> Result<PrincipalId> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(session_id).await
    }

    async fn find_by_principal(&self, principal: &PrincipalId) -> Result<String> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_principal(principal).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(session_id).await
    }

    async fn create_exclusive(&self, principal: &PrincipalId) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_exclusive(principal).await
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl()
    }
}
