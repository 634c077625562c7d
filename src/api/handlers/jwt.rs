use crate::{
    auth::middleware::AuthUser,
    types::{
        AppError, ErrorResponse, LoginRequest, RefreshRequest, Result, StatusResponse, TokenPair,
    },
    AppState,
};
use axum::{extract::State, Json};

/// Login with username and password, receiving an access/refresh pair
#[utoipa::path(
    post,
    path = "/jwt_login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "token"
)]
pub async fn jwt_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidInput(
            "username and password are required".to_string(),
        ));
    }

    let pair = state
        .token_auth
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(pair))
}

/// Exchange a refresh token for a new pair; the presented token is retired
#[utoipa::path(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token rotated", body = TokenPair),
        (status = 400, description = "Missing refresh token", body = ErrorResponse),
        (status = 401, description = "Invalid, expired or already used refresh token", body = ErrorResponse)
    ),
    tag = "token"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    if payload.refresh_token.is_empty() {
        return Err(AppError::InvalidInput("refresh_token is required".to_string()));
    }

    let pair = state.token_auth.refresh(&payload.refresh_token).await?;

    Ok(Json(pair))
}

/// Revoke the caller's refresh token
#[utoipa::path(
    get,
    path = "/v1/logout",
    responses(
        (status = 200, description = "Logged out", body = StatusResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "token"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<StatusResponse>> {
    state.token_auth.logout(&principal.id).await?;
    Ok(Json(StatusResponse::ok()))
}
