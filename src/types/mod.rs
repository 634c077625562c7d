use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ============= Identity Types =============

/// Stable identifier of a user record owned by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Wrap a user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which credential scheme authenticated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Bearer access token
    Token,
    /// `session_id` cookie
    Session,
}

/// Principal resolved by one of the gates and stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    /// Authenticated user
    pub id: PrincipalId,
    /// Scheme that proved the identity
    pub scheme: AuthScheme,
}

// ============= Token Types =============

/// Discriminator embedded in every signed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token accepted by the token gate
    Access,
    /// Long-lived token accepted only by `/refresh`
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject
    pub sub: PrincipalId,
    /// Access or refresh
    pub token_type: TokenType,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
    /// Issue time as a unix timestamp (seconds).
    pub iat: i64,
    /// Unique token id; keeps two tokens minted in the same second distinct.
    pub jti: String,
}

/// Stored refresh token; `token_hash` is the SHA-256 hex digest of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    /// Row id
    pub id: i64,
    /// Owning user
    pub principal: PrincipalId,
    /// SHA-256 hex digest of the token
    pub token_hash: String,
    /// Token expiry as a unix timestamp (seconds)
    pub expires_at: i64,
    /// Insertion time as a unix timestamp (seconds)
    pub created_at: i64,
}

/// Result of a successful session login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Opaque id carried in the `session_id` cookie
    pub session_id: String,
    /// Session owner
    pub principal: PrincipalId,
    /// Wall-clock expiry, used for the cookie `Expires` attribute
    pub expires_at: chrono::DateTime<chrono::Utc>,
    /// Store TTL, used for the cookie `Max-Age` attribute
    pub ttl: std::time::Duration,
}

// ============= API Request/Response Types =============

/// Body of `/jwt_login` and `/session_login`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Body of `/refresh`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token to exchange
    pub refresh_token: String,
}

/// Access/refresh pair returned by `/jwt_login` and `/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    /// Access token for the `Authorization` header
    pub access_token: String,
    /// One-time refresh token
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Body returned by `/session_login`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Session id, also set as the `session_id` cookie
    pub session_id: String,
    /// Session lifetime in seconds
    pub expires_in: i64,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// Always `OK`
    pub status: String,
}

impl StatusResponse {
    /// The `{"status": "OK"}` body.
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

/// Identity of the caller, returned by the `me` endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// User id
    pub user_id: PrincipalId,
    /// Login name
    pub username: String,
    /// Scheme that authenticated the request
    pub scheme: AuthScheme,
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Client-facing message
    pub error: String,
}

// ============= Error Types =============

/// Errors surfaced by the authentication core and the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Malformed token, bad signature or wrong algorithm
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Access token presented where a refresh token is required, or the reverse
    #[error("Token type mismatch: expected {expected}, found {found}")]
    TokenTypeMismatch {
        /// Type the caller required
        expected: TokenType,
        /// Type embedded in the token
        found: TokenType,
    },

    /// Token expiry has passed
    #[error("Token expired")]
    Expired,

    /// Valid refresh token that is no longer on record
    #[error("Refresh token not recognized")]
    TokenNotRecognized,

    /// Session id unknown or expired
    #[error("Session not found")]
    SessionNotFound,

    /// The principal already holds a live session
    #[error("Session already exists")]
    SessionAlreadyExists,

    /// No bearer token or session cookie was presented
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Generic rejection used by the session gate
    #[error("Unauthorized")]
    Unauthorized,

    /// Storage-layer failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Operation deadline elapsed
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Token could not be signed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures that are the caller's fault rather than the server's.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredentials
                | AppError::InvalidToken(_)
                | AppError::TokenTypeMismatch { .. }
                | AppError::Expired
                | AppError::TokenNotRecognized
                | AppError::SessionNotFound
                | AppError::SessionAlreadyExists
                | AppError::MissingCredential(_)
                | AppError::Unauthorized
        )
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials".to_string()),
            AppError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "invalid token".to_string()),
            AppError::TokenTypeMismatch { .. } => {
                (StatusCode::UNAUTHORIZED, "invalid token type".to_string())
            }
            AppError::Expired => (StatusCode::UNAUTHORIZED, "token expired".to_string()),
            AppError::TokenNotRecognized => {
                (StatusCode::UNAUTHORIZED, "refresh token not found".to_string())
            }
            AppError::SessionNotFound => (StatusCode::UNAUTHORIZED, "session not found".to_string()),
            AppError::SessionAlreadyExists => {
                (StatusCode::CONFLICT, "session already exists".to_string())
            }
            AppError::MissingCredential(what) => {
                (StatusCode::UNAUTHORIZED, format!("missing {}", what))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Cancelled(msg) => {
                tracing::warn!(reason = %msg, "request cancelled before completion");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "request timed out".to_string(),
                )
            }
            AppError::Persistence(msg) | AppError::Signing(msg) | AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
