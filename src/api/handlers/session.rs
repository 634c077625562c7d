use crate::{
    auth::middleware::{extract_session_cookie, SESSION_COOKIE_NAME},
    types::{AppError, ErrorResponse, LoginRequest, Result, SessionGrant, SessionResponse, StatusResponse},
    AppState,
};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// `Set-Cookie` value carrying a freshly granted session.
pub fn session_cookie(grant: &SessionGrant, secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}; Expires={}",
        grant.session_id,
        grant.ttl.as_secs(),
        grant.expires_at.format("%a, %d %b %Y %H:%M:%S GMT"),
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid session cookie: {}", e)))
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires={EPOCH_HTTP_DATE}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid session cookie: {}", e)))
}

/// Login with username and password, opening a server-side session
#[utoipa::path(
    post,
    path = "/session_login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created; `session_id` cookie set", body = SessionResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 409, description = "A live session already exists", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn session_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidInput(
            "username and password are required".to_string(),
        ));
    }

    let grant = state
        .session_auth
        .login(&payload.username, &payload.password)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session_cookie(&grant, state.config.session.cookie_secure)?,
    );

    let body = SessionResponse {
        session_id: grant.session_id,
        expires_in: i64::try_from(grant.ttl.as_secs())
            .map_err(|_| AppError::Internal("session ttl out of range".to_string()))?,
    };

    Ok((headers, Json(body)).into_response())
}

/// End the session named by the `session_id` cookie and clear the cookie
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Session ended; cookie cleared", body = StatusResponse),
        (status = 401, description = "No session cookie presented", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn session_logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let session_id = extract_session_cookie(&headers);

    state.session_auth.logout(session_id.as_deref()).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        SET_COOKIE,
        clear_session_cookie(state.config.session.cookie_secure)?,
    );

    Ok((response_headers, Json(StatusResponse::ok())).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrincipalId;
    use chrono::TimeZone;
    use std::time::Duration;

    fn grant() -> SessionGrant {
        SessionGrant {
            session_id: "abc123".to_string(),
            principal: PrincipalId::new("p"),
            expires_at: chrono::Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap(),
            ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie(&grant(), false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "session_id=abc123; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Expires=Wed, 02 Jan 2030 03:04:05 GMT"
        );
    }

    #[test]
    fn test_secure_flag() {
        let cookie = session_cookie(&grant(), true).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_at_epoch() {
        let cookie = clear_session_cookie(false).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("session_id=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }
}
