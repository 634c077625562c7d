use crate::auth::password::check_credentials;
use crate::db::traits::UserDirectory;
use crate::session::SessionStore;
use crate::types::{AppError, PrincipalId, Result, SessionGrant};
use async_trait::async_trait;
use std::sync::Arc;

/// Login and logout for the server-side session scheme.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// Verify credentials and open a session. Fails with
    /// `SessionAlreadyExists` while the principal holds a live session.
    async fn login(&self, username: &str, password: &str) -> Result<SessionGrant>;

    /// End the session named by the cookie value. A missing cookie is an error;
    /// an already-gone session is not.
    async fn logout(&self, session_id: Option<&str>) -> Result<()>;

    /// Resolve the principal for the session gate. Never mutates state.
    async fn authenticate(&self, session_id: &str) -> Result<PrincipalId>;
}

/// [`SessionAuthenticator`] over a [`SessionStore`].
pub struct StoreSessionAuthenticator {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
}

impl StoreSessionAuthenticator {
    /// Create an authenticator over `store`, resolving users through `users`.
    pub fn new(store: Arc<dyn SessionStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }
}

#[async_trait]
impl SessionAuthenticator for StoreSessionAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<SessionGrant> {
        let user = match check_credentials(self.users.as_ref(), username, password).await {
            Ok(user) => user,
            Err(e) => {
                if e.is_auth_failure() {
                    tracing::warn!("session login rejected");
                }
                return Err(e);
            }
        };

        let session_id = match self.store.create_exclusive(&user.id).await {
            Ok(id) => id,
            Err(AppError::SessionAlreadyExists) => {
                tracing::warn!(principal = %user.id, "session already exists");
                return Err(AppError::SessionAlreadyExists);
            }
            Err(e) => return Err(e),
        };

        let ttl = self.store.ttl();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AppError::Internal("session ttl out of range".to_string()))?;

        tracing::info!(principal = %user.id, "session login succeeded");

        Ok(SessionGrant {
            session_id,
            principal: user.id,
            expires_at,
            ttl,
        })
    }

    async fn logout(&self, session_id: Option<&str>) -> Result<()> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::MissingCredential("session cookie".to_string()))?;

        self.store.delete(session_id).await?;
        tracing::info!("session logout");
        Ok(())
    }

    async fn authenticate(&self, session_id: &str) -> Result<PrincipalId> {
        self.store.get(session_id).await
    }
}
