//! Shared setup for integration tests.

#![allow(dead_code)]

pub mod mocks;

use authgate::{
    api::routes::build_app, auth::password::hash_password, db::UserDirectory, AppState,
    AuthGateConfig, TursoClient,
};
use axum_test::TestServer;
use mocks::CountingSessionStore;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub server: TestServer,
    pub sessions: Arc<CountingSessionStore>,
    pub db: Arc<TursoClient>,
    pub user_id: String,
}

pub async fn create_test_app() -> TestApp {
    let mut config = AuthGateConfig::default();
    config.database.url = ":memory:".to_string();

    let db = Arc::new(TursoClient::new_memory().await.expect("in-memory db"));
    let user = db
        .create_user(USERNAME, &hash_password(PASSWORD).unwrap(), None)
        .await
        .expect("seed user");

    let sessions = Arc::new(CountingSessionStore::new(Duration::from_secs(3600)));
    let state = AppState::assemble(config, TEST_SECRET, db.clone(), sessions.clone());

    TestApp {
        server: TestServer::new(build_app(state)).expect("test server"),
        sessions,
        db,
        user_id: user.id.to_string(),
    }
}

pub fn credentials() -> serde_json::Value {
    serde_json::json!({ "username": USERNAME, "password": PASSWORD })
}
