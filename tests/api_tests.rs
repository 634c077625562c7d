//! End-to-end tests against the full router with an in-memory database.

mod common;

use authgate::db::UserDirectory;
use axum::http::StatusCode;
use common::{create_test_app, credentials, PASSWORD, USERNAME};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

async fn jwt_login(server: &axum_test::TestServer) -> Value {
    let response = server.post("/jwt_login").json(&credentials()).await;
    response.assert_status_ok();
    response.json::<Value>()
}

fn bearer(token: &Value) -> String {
    format!("Bearer {}", token.as_str().expect("token string"))
}

// ============= Health / docs =============

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_test_app().await;
    let response = app.server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();

    let doc = response.json::<Value>();
    assert!(doc["paths"]["/jwt_login"].is_object());
    assert!(doc["paths"]["/session_login"].is_object());
}

// ============= Token scheme =============

#[tokio::test]
async fn test_jwt_login_returns_pair() {
    let app = create_test_app().await;
    let body = jwt_login(&app.server).await;

    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
}

#[tokio::test]
async fn test_jwt_login_rejects_bad_password_and_unknown_user_alike() {
    let app = create_test_app().await;

    let wrong_password = app
        .server
        .post("/jwt_login")
        .json(&json!({ "username": USERNAME, "password": "nope" }))
        .await;
    wrong_password.assert_status_unauthorized();

    let unknown_user = app
        .server
        .post("/jwt_login")
        .json(&json!({ "username": "mallory", "password": PASSWORD }))
        .await;
    unknown_user.assert_status_unauthorized();

    assert_eq!(
        wrong_password.json::<Value>(),
        unknown_user.json::<Value>()
    );
    assert_eq!(wrong_password.json::<Value>()["error"], "invalid credentials");
}

#[tokio::test]
async fn test_jwt_login_requires_fields() {
    let app = create_test_app().await;
    let response = app
        .server
        .post("/jwt_login")
        .json(&json!({ "username": "", "password": "" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_refresh_rotates_pair() {
    let app = create_test_app().await;
    let first = jwt_login(&app.server).await;

    let response = app
        .server
        .post("/refresh")
        .json(&json!({ "refresh_token": first["refresh_token"] }))
        .await;
    response.assert_status_ok();
    let second = response.json::<Value>();

    assert_ne!(second["refresh_token"], first["refresh_token"]);

    let me = app
        .server
        .get("/v1/me")
        .add_header("Authorization", bearer(&second["access_token"]))
        .await;
    me.assert_status_ok();
}

#[tokio::test]
async fn test_old_refresh_token_rejected_after_rotation() {
    let app = create_test_app().await;
    let first = jwt_login(&app.server).await;

    app.server
        .post("/refresh")
        .json(&json!({ "refresh_token": first["refresh_token"] }))
        .await
        .assert_status_ok();

    let replay = app
        .server
        .post("/refresh")
        .json(&json!({ "refresh_token": first["refresh_token"] }))
        .await;
    replay.assert_status_unauthorized();
    assert_eq!(replay.json::<Value>()["error"], "refresh token not found");
}

#[tokio::test]
async fn test_second_login_supersedes_first_refresh_token() {
    let app = create_test_app().await;
    let first = jwt_login(&app.server).await;
    let second = jwt_login(&app.server).await;

    app.server
        .post("/refresh")
        .json(&json!({ "refresh_token": first["refresh_token"] }))
        .await
        .assert_status_unauthorized();

    app.server
        .post("/refresh")
        .json(&json!({ "refresh_token": second["refresh_token"] }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_access_token_rejected_at_refresh() {
    let app = create_test_app().await;
    let pair = jwt_login(&app.server).await;

    let response = app
        .server
        .post("/refresh")
        .json(&json!({ "refresh_token": pair["access_token"] }))
        .await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "invalid token type");
}

#[tokio::test]
async fn test_refresh_token_rejected_by_token_gate() {
    let app = create_test_app().await;
    let pair = jwt_login(&app.server).await;

    let response = app
        .server
        .get("/v1/me")
        .add_header("Authorization", bearer(&pair["refresh_token"]))
        .await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "invalid token type");
}

#[tokio::test]
async fn test_token_gate_requires_bearer() {
    let app = create_test_app().await;

    let missing = app.server.get("/v1/me").await;
    missing.assert_status_unauthorized();
    assert_eq!(missing.json::<Value>()["error"], "missing bearer token");

    let garbage = app
        .server
        .get("/v1/me")
        .add_header("Authorization", "Bearer not.a.token")
        .await;
    garbage.assert_status_unauthorized();
    assert_eq!(garbage.json::<Value>()["error"], "invalid token");
}

#[tokio::test]
async fn test_me_reports_token_scheme() {
    let app = create_test_app().await;
    let pair = jwt_login(&app.server).await;

    let response = app
        .server
        .get("/v1/me")
        .add_header("Authorization", bearer(&pair["access_token"]))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["user_id"], app.user_id.as_str());
    assert_eq!(body["username"], USERNAME);
    assert_eq!(body["scheme"], "token");
}

#[tokio::test]
async fn test_token_logout_revokes_refresh_token() {
    let app = create_test_app().await;
    let pair = jwt_login(&app.server).await;

    app.server
        .get("/v1/logout")
        .add_header("Authorization", bearer(&pair["access_token"]))
        .await
        .assert_status_ok();

    app.server
        .post("/refresh")
        .json(&json!({ "refresh_token": pair["refresh_token"] }))
        .await
        .assert_status_unauthorized();

    // Logout is idempotent while the access token is still valid.
    app.server
        .get("/v1/logout")
        .add_header("Authorization", bearer(&pair["access_token"]))
        .await
        .assert_status_ok();
}

// ============= Session scheme =============

#[tokio::test]
async fn test_session_login_sets_cookie() {
    let app = create_test_app().await;

    let response = app.server.post("/session_login").json(&credentials()).await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let session_id = body["session_id"].as_str().expect("session id").to_string();
    assert_eq!(session_id.len(), 64);
    assert_eq!(body["expires_in"], 3600);

    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with(&format!("session_id={}", session_id)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.contains("Expires="));
}

#[tokio::test]
async fn test_second_session_login_conflicts() {
    let app = create_test_app().await;

    app.server
        .post("/session_login")
        .json(&credentials())
        .await
        .assert_status_ok();

    let second = app.server.post("/session_login").json(&credentials()).await;
    second.assert_status(StatusCode::CONFLICT);
    assert_eq!(second.json::<Value>()["error"], "session already exists");
    assert_eq!(app.sessions.live_sessions(), 1);
}

#[tokio::test]
async fn test_session_gate_and_logout() {
    let app = create_test_app().await;

    let login = app.server.post("/session_login").json(&credentials()).await;
    let session_id = login.json::<Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    let cookie = format!("session_id={}", session_id);

    let me = app
        .server
        .get("/session/me")
        .add_header("Cookie", cookie.clone())
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["scheme"], "session");

    let logout = app
        .server
        .get("/logout")
        .add_header("Cookie", cookie.clone())
        .await;
    logout.assert_status_ok();
    let cleared = logout.header("set-cookie");
    let cleared = cleared.to_str().unwrap();
    assert!(cleared.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    assert!(cleared.contains("Max-Age=0"));

    let after = app
        .server
        .get("/session/me")
        .add_header("Cookie", cookie)
        .await;
    after.assert_status_unauthorized();
    assert_eq!(after.json::<Value>()["error"], "unauthorized");

    // The principal may log in again once the session is gone.
    app.server
        .post("/session_login")
        .json(&credentials())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_session_logout_without_cookie_never_reaches_store() {
    let app = create_test_app().await;

    let response = app.server.get("/logout").await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "missing session cookie");

    assert_eq!(app.sessions.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(app.sessions.total_calls(), 0);
}

#[tokio::test]
async fn test_session_gate_requires_cookie() {
    let app = create_test_app().await;

    let response = app.server.get("/session/me").await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "missing session cookie");
    assert_eq!(app.sessions.total_calls(), 0);
}

#[tokio::test]
async fn test_session_gate_does_not_mutate_store() {
    let app = create_test_app().await;
    let login = app.server.post("/session_login").json(&credentials()).await;
    let session_id = login.json::<Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let before_creates = app.sessions.creates.load(Ordering::SeqCst);
    for _ in 0..3 {
        app.server
            .get("/session/me")
            .add_header("Cookie", format!("session_id={}", session_id))
            .await
            .assert_status_ok();
    }

    assert_eq!(app.sessions.creates.load(Ordering::SeqCst), before_creates);
    assert_eq!(app.sessions.deletes.load(Ordering::SeqCst), 0);
    assert_eq!(app.sessions.gets.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_schemes_are_not_interchangeable() {
    let app = create_test_app().await;
    let pair = jwt_login(&app.server).await;

    // An access token is not a session id.
    app.server
        .get("/session/me")
        .add_header(
            "Cookie",
            format!("session_id={}", pair["access_token"].as_str().unwrap()),
        )
        .await
        .assert_status_unauthorized();

    // A session id is not a bearer token.
    let login = app.server.post("/session_login").json(&credentials()).await;
    let session_id = login.json::<Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    app.server
        .get("/v1/me")
        .add_header("Authorization", format!("Bearer {}", session_id))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_and_session_logins_are_independent() {
    let app = create_test_app().await;

    let pair = jwt_login(&app.server).await;
    app.server
        .post("/session_login")
        .json(&credentials())
        .await
        .assert_status_ok();

    // Session login leaves the refresh token alone.
    app.server
        .post("/refresh")
        .json(&json!({ "refresh_token": pair["refresh_token"] }))
        .await
        .assert_status_ok();

    assert!(app.db.find_user_by_name(USERNAME).await.unwrap().is_some());
}
