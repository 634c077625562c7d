//! API request handlers.

/// Liveness check.
pub mod health;
/// Signed-token scheme: login, refresh, logout.
pub mod jwt;
/// Identity of the authenticated caller.
pub mod me;
/// Session scheme: login, logout, cookie helpers.
pub mod session;
