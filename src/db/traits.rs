//! Persistence collaborators used by the authenticators
//!
//! The authentication core never talks to libsql directly. It sees two narrow
//! capabilities:
//!
//! - [`UserDirectory`]: lookups into the user records (plus `create_user` for
//!   provisioning from the CLI and tests)
//! - [`RefreshTokenRepository`]: the rows behind the refresh-token ledger
//!
//! [`TursoClient`](super::turso::TursoClient) implements both. Tests swap in
//! mocks generated by `mockall`.
//!
//! # Example
//!
//! ```rust,ignore
//! use authgate::db::DatabaseProvider;
//!
//! // Ephemeral database, useful for development and tests
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // File-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data/authgate.db".into() }.create_client().await?;
//! ```

use crate::types::{PrincipalId, RefreshTokenRecord, Result};
use crate::utils::toml_config::AuthGateConfig;
use async_trait::async_trait;

use super::turso::TursoClient;

/// Database provider configuration
#[derive(Debug, Clone, Default)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Open the database described by this provider and ensure the schema exists
    pub async fn create_client(&self) -> Result<TursoClient> {
        match self {
            DatabaseProvider::Memory => TursoClient::new_memory().await,
            DatabaseProvider::SQLite { path } => TursoClient::new_local(path).await,
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                TursoClient::new_remote(url.clone(), auth_token.clone()).await
            }
        }
    }

    /// Pick a provider from the `[database]` section.
    ///
    /// Remote credentials win when the `turso` feature is on and both env vars
    /// resolve; otherwise `url` selects memory or a local file.
    pub fn from_config(config: &AuthGateConfig) -> Self {
        #[cfg(feature = "turso")]
        {
            if let Some((url, auth_token)) = config.turso_credentials() {
                return DatabaseProvider::Turso { url, auth_token };
            }
        }

        match config.database.url.as_str() {
            ":memory:" | "" => DatabaseProvider::Memory,
            path => DatabaseProvider::SQLite {
                path: path.to_string(),
            },
        }
    }
}

/// A user row as seen by the authentication core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: PrincipalId,
    pub username: String,
    pub password_hash: String,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Read access to user records, plus provisioning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: &PrincipalId) -> Result<Option<UserRecord>>;

    /// Insert a user. Fails with `InvalidInput` if the username is taken.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        description: Option<String>,
    ) -> Result<UserRecord>;
}

/// Rows behind the refresh-token ledger. At most one row per principal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert or replace the principal's row in a single statement.
    async fn insert_refresh_token(
        &self,
        principal: &PrincipalId,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<()>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_refresh_token_by_user(&self, principal: &PrincipalId) -> Result<u64>;

    /// Delete the principal's row only if it still holds `token_hash`.
    async fn delete_refresh_token_if_matches(
        &self,
        principal: &PrincipalId,
        token_hash: &str,
    ) -> Result<bool>;

    async fn row_count_for_token(&self, token_hash: &str) -> Result<u64>;

    async fn get_refresh_token(&self, principal: &PrincipalId)
        -> Result<Option<RefreshTokenRecord>>;
}
