use crate::{
    auth::middleware::AuthUser,
    types::{AppError, ErrorResponse, MeResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Describe the authenticated caller under either scheme
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "identity"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<MeResponse>> {
    let user = state
        .users
        .find_user_by_id(&principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user no longer exists".to_string()))?;

    Ok(Json(MeResponse {
        user_id: user.id,
        username: user.username,
        scheme: principal.scheme,
    }))
}

/// Same as `/v1/me`, reachable with a session cookie
#[utoipa::path(
    get,
    path = "/session/me",
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "identity"
)]
pub async fn session_me(
    state: State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>> {
    me(state, user).await
}
