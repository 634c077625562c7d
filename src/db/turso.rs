use crate::db::traits::{RefreshTokenRepository, UserDirectory, UserRecord};
use crate::types::{AppError, PrincipalId, RefreshTokenRecord, Result};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection, Database, Value};

/// libsql-backed store for users and refresh tokens.
///
/// In-memory databases live only as long as their connection, so they keep
/// one shared connection; file and remote databases open one per operation.
pub struct TursoClient {
    db: Database,
    shared: Option<Connection>,
}

impl TursoClient {
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to open in-memory database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Persistence(format!("Failed to get connection: {}", e)))?;

        let client = Self {
            db,
            shared: Some(conn),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Persistence(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to open database {}: {}", path, e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to connect to Turso: {}", e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Result<Connection> {
        if let Some(conn) = &self.shared {
            return Ok(conn.clone());
        }
        self.db
            .connect()
            .map_err(|e| AppError::Persistence(format!("Failed to get connection: {}", e)))
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to create users table: {}", e)))?;

        // One row per principal; the UNIQUE constraint backs the upsert.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS refresh_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT UNIQUE NOT NULL,
                token_hash TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Persistence(format!("Failed to create refresh_tokens table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_hash ON refresh_tokens(token_hash)",
            (),
        )
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to create token index: {}", e)))?;

        Ok(())
    }

    async fn query_user(&self, sql: &str, key: &str) -> Result<Option<UserRecord>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(sql, [key])
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to query user: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?
        {
            Ok(Some(UserRecord {
                id: PrincipalId(
                    row.get::<String>(0)
                        .map_err(|e| AppError::Persistence(e.to_string()))?,
                ),
                username: row.get(1).map_err(|e| AppError::Persistence(e.to_string()))?,
                password_hash: row.get(2).map_err(|e| AppError::Persistence(e.to_string()))?,
                description: row
                    .get::<Option<String>>(3)
                    .map_err(|e| AppError::Persistence(e.to_string()))?,
                created_at: row.get(4).map_err(|e| AppError::Persistence(e.to_string()))?,
            }))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl UserDirectory for TursoClient {
    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserRecord>> {
        self.query_user(
            "SELECT id, username, password_hash, description, created_at
             FROM users WHERE username = ?",
            username,
        )
        .await
    }

    async fn find_user_by_id(&self, id: &PrincipalId) -> Result<Option<UserRecord>> {
        self.query_user(
            "SELECT id, username, password_hash, description, created_at
             FROM users WHERE id = ?",
            id.as_str(),
        )
        .await
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        description: Option<String>,
    ) -> Result<UserRecord> {
        if self.find_user_by_name(username).await?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "user '{}' already exists",
                username
            )));
        }

        let conn = self.connection()?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let description_value = match &description {
            Some(text) => Value::Text(text.clone()),
            None => Value::Null,
        };

        conn.execute(
            "INSERT INTO users (id, username, password_hash, description, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (id.as_str(), username, password_hash, description_value, now),
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                AppError::InvalidInput(format!("user '{}' already exists", username))
            } else {
                AppError::Persistence(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(UserRecord {
            id: PrincipalId(id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            description,
            created_at: now,
        })
    }
}

#[async_trait]
impl RefreshTokenRepository for TursoClient {
    async fn insert_refresh_token(
        &self,
        principal: &PrincipalId,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<()> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                token_hash = excluded.token_hash,
                expires_at = excluded.expires_at,
                created_at = excluded.created_at",
            (principal.as_str(), token_hash, expires_at, now),
        )
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to store refresh token: {}", e)))?;

        Ok(())
    }

    async fn delete_refresh_token_by_user(&self, principal: &PrincipalId) -> Result<u64> {
        let conn = self.connection()?;

        conn.execute(
            "DELETE FROM refresh_tokens WHERE user_id = ?",
            [principal.as_str()],
        )
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to delete refresh token: {}", e)))
    }

    async fn delete_refresh_token_if_matches(
        &self,
        principal: &PrincipalId,
        token_hash: &str,
    ) -> Result<bool> {
        let conn = self.connection()?;

        let affected = conn
            .execute(
                "DELETE FROM refresh_tokens WHERE user_id = ? AND token_hash = ?",
                (principal.as_str(), token_hash),
            )
            .await
            .map_err(|e| {
                AppError::Persistence(format!("Failed to consume refresh token: {}", e))
            })?;

        Ok(affected == 1)
    }

    async fn row_count_for_token(&self, token_hash: &str) -> Result<u64> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM refresh_tokens WHERE token_hash = ?",
                [token_hash],
            )
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to count refresh tokens: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?
        {
            Some(row) => {
                let count: i64 = row.get(0).map_err(|e| AppError::Persistence(e.to_string()))?;
                Ok(count.max(0) as u64)
            }
            None => Ok(0),
        }
    }

    async fn get_refresh_token(
        &self,
        principal: &PrincipalId,
    ) -> Result<Option<RefreshTokenRecord>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, user_id, token_hash, expires_at, created_at
                 FROM refresh_tokens WHERE user_id = ?",
                [principal.as_str()],
            )
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to query refresh token: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?
        {
            Ok(Some(RefreshTokenRecord {
                id: row.get(0).map_err(|e| AppError::Persistence(e.to_string()))?,
                principal: PrincipalId(
                    row.get::<String>(1)
                        .map_err(|e| AppError::Persistence(e.to_string()))?,
                ),
                token_hash: row.get(2).map_err(|e| AppError::Persistence(e.to_string()))?,
                expires_at: row.get(3).map_err(|e| AppError::Persistence(e.to_string()))?,
                created_at: row.get(4).map_err(|e| AppError::Persistence(e.to_string()))?,
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(client: &TursoClient, username: &str) -> PrincipalId {
        client.create_user(username, "hash", None).await.unwrap().id
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let client = TursoClient::new_memory().await.unwrap();

        let created = client
            .create_user("alice", "$argon2id$fake", Some("ops".to_string()))
            .await
            .unwrap();

        let by_name = client.find_user_by_name("alice").await.unwrap().unwrap();
        assert_eq!(by_name, created);

        let by_id = client.find_user_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.description.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let client = TursoClient::new_memory().await.unwrap();
        client.create_user("bob", "hash", None).await.unwrap();

        let result = client.create_user("bob", "hash", None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_principal() {
        let client = TursoClient::new_memory().await.unwrap();
        let principal = seed_user(&client, "dave").await;

        client
            .insert_refresh_token(&principal, "hash-a", 100)
            .await
            .unwrap();
        client
            .insert_refresh_token(&principal, "hash-b", 200)
            .await
            .unwrap();

        assert_eq!(client.row_count_for_token("hash-a").await.unwrap(), 0);
        assert_eq!(client.row_count_for_token("hash-b").await.unwrap(), 1);

        let record = client.get_refresh_token(&principal).await.unwrap().unwrap();
        assert_eq!(record.token_hash, "hash-b");
        assert_eq!(record.expires_at, 200);
    }

    #[tokio::test]
    async fn test_compare_and_delete() {
        let client = TursoClient::new_memory().await.unwrap();
        let principal = seed_user(&client, "erin").await;
        client
            .insert_refresh_token(&principal, "current", 100)
            .await
            .unwrap();

        assert!(!client
            .delete_refresh_token_if_matches(&principal, "stale")
            .await
            .unwrap());
        assert!(client
            .delete_refresh_token_if_matches(&principal, "current")
            .await
            .unwrap());
        assert!(!client
            .delete_refresh_token_if_matches(&principal, "current")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_user_is_idempotent() {
        let client = TursoClient::new_memory().await.unwrap();
        let principal = seed_user(&client, "frank").await;
        client
            .insert_refresh_token(&principal, "h", 100)
            .await
            .unwrap();

        assert_eq!(client.delete_refresh_token_by_user(&principal).await.unwrap(), 1);
        assert_eq!(client.delete_refresh_token_by_user(&principal).await.unwrap(), 0);
        assert!(client.get_refresh_token(&principal).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_requires_existing_user() {
        let client = TursoClient::new_memory().await.unwrap();
        let ghost = PrincipalId::new("no-such-user");

        let result = client.insert_refresh_token(&ghost, "h", 100).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(client.row_count_for_token("h").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_local_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("authgate.db");
        let path = path.to_string_lossy().to_string();

        {
            let client = TursoClient::new_local(&path).await.unwrap();
            client.create_user("carol", "hash", None).await.unwrap();
        }

        let reopened = TursoClient::new_local(&path).await.unwrap();
        assert!(reopened.find_user_by_name("carol").await.unwrap().is_some());
    }
}
