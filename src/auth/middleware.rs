use crate::types::{AppError, AuthScheme, AuthenticatedPrincipal};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Value of the `session_id` cookie, if present and non-empty.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
        })
        .find(|val| !val.is_empty())
}

/// Gate for the signed-token scheme.
///
/// Requires a valid, unexpired access token. The downstream handler never runs
/// on failure, and the validation error is returned as-is.
pub async fn token_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let token = extract_bearer_token(req.headers())
            .ok_or_else(|| AppError::MissingCredential("bearer token".to_string()))?;
        state.token_auth.authenticate(token).map_err(|e| {
            tracing::warn!(error = %e, "access token rejected");
            e
        })?
    };

    req.extensions_mut().insert(AuthenticatedPrincipal {
        id: claims.sub,
        scheme: AuthScheme::Token,
    });

    Ok(next.run(req).await)
}

/// Gate for the session scheme.
///
/// Looks up the `session_id` cookie; any lookup failure is reported as
/// `Unauthorized`.
pub async fn session_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = extract_session_cookie(req.headers())
        .ok_or_else(|| AppError::MissingCredential("session cookie".to_string()))?;

    let principal = match state.session_auth.authenticate(&session_id).await {
        Ok(principal) => principal,
        Err(e) if e.is_auth_failure() => {
            tracing::warn!(error = %e, "session rejected");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    req.extensions_mut().insert(AuthenticatedPrincipal {
        id: principal,
        scheme: AuthScheme::Session,
    });

    Ok(next.run(req).await)
}

/// Extractor for the principal injected by either gate.
pub struct AuthUser(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
