//! Server-side session storage.
//!
//! A session maps an opaque, randomly generated identifier to a principal for
//! a fixed time-to-live. Expired sessions are indistinguishable from sessions
//! that never existed.
//!
//! Backends:
//! - [`MemorySessionStore`]: in-process map, always available
//! - `RedisSessionStore`: shared Redis instance (`redis` feature)

use crate::types::{AppError, PrincipalId, Result};
use async_trait::async_trait;
use rand::RngCore;
use std::time::Duration;

/// In-process backend.
pub mod memory;
/// Redis backend.
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemorySessionStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisSessionStore;

/// Length in bytes of a session identifier before hex encoding.
pub const SESSION_ID_BYTES: usize = 32;

/// Volatile keyed store of `session id -> principal` with a fixed TTL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for `principal` and return its id.
    async fn create(&self, principal: &PrincipalId) -> Result<String>;

    /// Resolve a live session. Fails with `SessionNotFound` if absent or expired.
    async fn get(&self, session_id: &str) -> Result<PrincipalId>;

    /// Linear scan for a live session owned by `principal`.
    async fn find_by_principal(&self, principal: &PrincipalId) -> Result<String>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Create a session unless `principal` already holds one.
    ///
    /// The default is check-then-create and is not atomic: two concurrent
    /// callers can both pass the check. Backends that can do better override it.
    async fn create_exclusive(&self, principal: &PrincipalId) -> Result<String> {
        match self.find_by_principal(principal).await {
            Ok(_) => Err(AppError::SessionAlreadyExists),
            Err(AppError::SessionNotFound) => self.create(principal).await,
            Err(e) => Err(e),
        }
    }

    /// Lifetime given to new sessions.
    fn ttl(&self) -> Duration;
}

/// 32 bytes from the thread-local CSPRNG, hex encoded.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), SESSION_ID_BYTES * 2);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let ids: HashSet<String> = (0..256).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 256);
    }
}
