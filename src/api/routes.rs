use crate::api::handlers::{health, jwt, me, session};
use crate::api::openapi::ApiDoc;
use crate::auth::middleware::{session_gate, token_gate};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Routes without the outer layers: public endpoints plus the two gated groups.
pub fn create_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/jwt_login", post(jwt::jwt_login))
        .route("/refresh", post(jwt::refresh))
        .route("/session_login", post(session::session_login))
        // Session logout reads the cookie itself so a missing cookie is
        // reported without consulting the store.
        .route("/logout", get(session::session_logout))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let token_routes = Router::new()
        .route("/logout", get(jwt::logout))
        .route("/me", get(me::me))
        .layer(middleware::from_fn_with_state(state.clone(), token_gate));

    let session_routes = Router::new()
        .route("/me", get(me::session_me))
        .layer(middleware::from_fn_with_state(state, session_gate));

    public_routes
        .nest("/v1", token_routes)
        .nest("/session", session_routes)
}

/// Complete application: routes, shared state and the request layers.
pub fn build_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let body_limit = state.config.server.max_body_bytes;

    let router = create_router(state.clone());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/swagger.json", ApiDoc::openapi()),
    );

    router
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
