//! # Authgate
//!
//! An HTTP authentication service with two interchangeable schemes:
//!
//! - **Signed tokens**: `POST /jwt_login` returns a short-lived access token and
//!   a long-lived refresh token. `POST /refresh` rotates the refresh token; each
//!   one can be exchanged exactly once.
//! - **Server-side sessions**: `POST /session_login` opens a session in a TTL
//!   store and sets the `session_id` cookie. One live session per principal.
//!
//! ## Overview
//!
//! Authgate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `authgate-server` binary
//! 2. **As a library** - Mount the gates and authenticators in your own router
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use authgate::{api::routes::build_app, AppState, AuthGateConfig};
//! use authgate::db::TursoClient;
//! use authgate::session::MemorySessionStore;
//! use std::sync::Arc;
//!
//! let config = AuthGateConfig::load("authgate.toml")?;
//! let db = Arc::new(TursoClient::new_memory().await?);
//! let sessions = Arc::new(MemorySessionStore::new(config.session.ttl()));
//! let state = AppState::assemble(config, b"a-secret-of-at-least-32-bytes!!!", db, sessions);
//!
//! let app = build_app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `turso` | Remote Turso database |
//! | `redis` | Redis-backed session store |
//! | `swagger-ui` | Interactive API documentation |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Signed tokens, refresh-token ledger, sessions and request gates.
pub mod auth;
/// Command-line interface (init, config, user provisioning).
pub mod cli;
/// Database clients (Turso/SQLite) and persistence traits.
pub mod db;
/// Session stores (in-memory, Redis).
pub mod session;
/// Core types (claims, requests, responses, errors).
pub mod types;
/// Configuration, logging and deadline utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::{
    JwtTokenAuthenticator, Ledger, RefreshTokenLedger, SessionAuthenticator,
    StoreSessionAuthenticator, TokenAuthenticator, TokenEngine,
};
pub use db::{DatabaseProvider, TursoClient, UserDirectory};
pub use session::{MemorySessionStore, SessionStore};
pub use types::{AppError, Result};
pub use utils::toml_config::{AuthGateConfig, ConfigError};

use std::sync::Arc;

/// Application state shared across handlers and gates
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<AuthGateConfig>,
    /// User lookups
    pub users: Arc<dyn UserDirectory>,
    /// Signed-token scheme
    pub token_auth: Arc<dyn TokenAuthenticator>,
    /// Session scheme
    pub session_auth: Arc<dyn SessionAuthenticator>,
}

impl AppState {
    /// Wire the engine, ledger and authenticators around the given stores.
    pub fn assemble<D>(
        config: AuthGateConfig,
        secret: &[u8],
        db: Arc<D>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self
    where
        D: UserDirectory + db::RefreshTokenRepository + 'static,
    {
        let engine = Arc::new(TokenEngine::new(
            secret,
            config.auth.access_ttl(),
            config.auth.refresh_ttl(),
        ));
        let ledger = Arc::new(RefreshTokenLedger::new(
            engine.clone(),
            db.clone(),
            config.database.operation_timeout(),
        ));

        let token_auth = Arc::new(JwtTokenAuthenticator::new(engine, ledger, db.clone()));
        let session_auth = Arc::new(StoreSessionAuthenticator::new(sessions, db.clone()));

        Self {
            config: Arc::new(config),
            users: db,
            token_auth,
            session_auth,
        }
    }

    /// Open the configured database and session backend and assemble the state.
    pub async fn from_config(config: AuthGateConfig) -> anyhow::Result<Self> {
        let secret = config.jwt_secret()?;

        let db = Arc::new(DatabaseProvider::from_config(&config).create_client().await?);
        let sessions = open_session_store(&config).await?;

        Ok(Self::assemble(config, secret.as_bytes(), db, sessions))
    }
}

async fn open_session_store(config: &AuthGateConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    use utils::toml_config::SessionBackend;

    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new(config.session.ttl()))),
        #[cfg(feature = "redis")]
        SessionBackend::Redis => {
            let url = config.redis_url()?;
            let store = session::RedisSessionStore::connect(
                &url,
                config.session.ttl(),
                config.database.operation_timeout(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        SessionBackend::Redis => {
            anyhow::bail!("session.backend = \"redis\" requires the 'redis' feature")
        }
    }
}
