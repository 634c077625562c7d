use crate::db::traits::{UserDirectory, UserRecord};
use crate::types::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

/// Hashes a password using Argon2id.
///
/// Returns a PHC-formatted hash string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// Verified against when the username is unknown so both failure paths cost
// one Argon2 run.
fn placeholder_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("authgate-placeholder").ok())
        .as_deref()
}

/// Resolve `username` and check `password` against the stored hash.
///
/// Unknown users and wrong passwords both yield `InvalidCredentials`.
/// Argon2 runs on the blocking pool so logins do not stall the async workers.
pub async fn check_credentials(
    users: &dyn UserDirectory,
    username: &str,
    password: &str,
) -> Result<UserRecord> {
    let user = users.find_user_by_name(username).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

    match (user, verify_on_blocking_pool(password, stored_hash).await?) {
        (Some(user), true) => Ok(user),
        _ => Err(AppError::InvalidCredentials),
    }
}

async fn verify_on_blocking_pool(password: &str, stored_hash: Option<String>) -> Result<bool> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(hash) = placeholder_hash() {
                let _ = verify_password(&password, hash);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
}
