//! Authentication core
//!
//! Two interchangeable schemes protect the API:
//!
//! - **Signed tokens**: short-lived access tokens plus one-time-use refresh
//!   tokens. The ledger keeps at most one outstanding refresh token per
//!   principal, so rotation and re-login both retire the previous one.
//! - **Server-side sessions**: opaque ids in a TTL store, carried in the
//!   `session_id` cookie, one live session per principal.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id hashing and credential checks
//! - [`auth::jwt`](crate::auth::jwt) - token engine (issue/validate) and token hashing
//! - [`auth::ledger`](crate::auth::ledger) - refresh-token ledger
//! - [`auth::token_auth`](crate::auth::token_auth) - login, rotation and logout for tokens
//! - [`auth::session_auth`](crate::auth::session_auth) - login and logout for sessions
//! - [`auth::middleware`](crate::auth::middleware) - request gates and the `AuthUser` extractor
//!
//! # Usage
//!
//! ```ignore
//! use authgate::auth::middleware::{token_gate, AuthUser};
//!
//! let protected = Router::new()
//!     .route("/me", get(me))
//!     .layer(middleware::from_fn_with_state(state.clone(), token_gate));
//!
//! async fn me(AuthUser(principal): AuthUser) -> String {
//!     principal.id.to_string()
//! }
//! ```

/// Signed-token engine and token hashing.
pub mod jwt;
/// Refresh-token ledger.
pub mod ledger;
/// Request gates and extractors for protected routes.
pub mod middleware;
/// Password hashing and credential verification.
pub mod password;
/// Session-scheme authenticator.
pub mod session_auth;
/// Token-scheme authenticator.
pub mod token_auth;

pub use jwt::TokenEngine;
pub use ledger::{Ledger, RefreshTokenLedger};
pub use session_auth::{SessionAuthenticator, StoreSessionAuthenticator};
pub use token_auth::{JwtTokenAuthenticator, TokenAuthenticator};
