//! `user add`: provision a user with an Argon2id password hash.

use super::output::Output;
use crate::auth::password::hash_password;
use crate::db::{DatabaseProvider, UserDirectory, UserRecord};
use crate::types::{AppError, Result};
use crate::utils::toml_config::AuthGateConfig;

/// Hash `password` and insert the user into the configured database.
pub async fn add_user(
    config: &AuthGateConfig,
    username: &str,
    password: &str,
    description: Option<String>,
    output: &Output,
) -> Result<UserRecord> {
    if username.trim().is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("password must not be empty".to_string()));
    }

    let db = DatabaseProvider::from_config(config).create_client().await?;
    let password_hash = hash_password(password)?;
    let user = db.create_user(username, &password_hash, description).await?;

    output.success(&format!("Created user '{}'", user.username));
    output.kv("id", user.id.as_str());

    Ok(user)
}
