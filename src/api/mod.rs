//! HTTP API Handlers and Routes
//!
//! # API Endpoints
//!
//! ## Signed tokens
//! - `POST /jwt_login` - Exchange credentials for an access/refresh pair
//! - `POST /refresh` - Rotate a refresh token
//! - `GET /v1/logout` - Revoke the caller's refresh token (bearer access token)
//! - `GET /v1/me` - Caller identity (bearer access token)
//!
//! ## Sessions
//! - `POST /session_login` - Open a session; sets the `session_id` cookie
//! - `GET /logout` - End the session named by the cookie and clear it
//! - `GET /session/me` - Caller identity (session cookie)
//!
//! ## Health
//! - `GET /health` - Liveness check
//!
//! # OpenAPI Documentation
//!
//! The document is served at `/api-docs/openapi.json`. With the `swagger-ui`
//! feature, interactive documentation is mounted at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// OpenAPI document.
pub mod openapi;
/// Router configuration and route definitions.
pub mod routes;
