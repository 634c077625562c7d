use crate::api::handlers;
use crate::types::{
    AuthScheme, ErrorResponse, LoginRequest, MeResponse, PrincipalId, RefreshRequest,
    SessionResponse, StatusResponse, TokenPair,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "Authgate", description = "Signed-token and session authentication"),
    paths(
        handlers::health::health,
        handlers::jwt::jwt_login,
        handlers::jwt::refresh,
        handlers::jwt::logout,
        handlers::session::session_login,
        handlers::session::session_logout,
        handlers::me::me,
        handlers::me::session_me,
    ),
    components(schemas(
        LoginRequest,
        RefreshRequest,
        TokenPair,
        SessionResponse,
        StatusResponse,
        MeResponse,
        ErrorResponse,
        PrincipalId,
        AuthScheme,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "token", description = "Signed access/refresh tokens"),
        (name = "session", description = "Server-side sessions"),
        (name = "identity", description = "Authenticated caller"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session_id"))),
            );
        }
    }
}
