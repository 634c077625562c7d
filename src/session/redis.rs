use super::{generate_session_id, SessionStore};
use crate::types::{AppError, PrincipalId, Result};
use crate::utils::deadline::with_deadline;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

const KEY_PREFIX: &str = "session:";
const SCAN_BATCH: usize = 100;

fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

fn session_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX).filter(|id| !id.is_empty())
}

/// Session id for `key` when its stored owner is `principal`.
fn owned_session_id(key: &str, owner: Option<&str>, principal: &PrincipalId) -> Option<String> {
    if owner == Some(principal.as_str()) {
        session_id_from_key(key).map(str::to_string)
    } else {
        None
    }
}

fn set_cmd(session_id: &str, principal: &PrincipalId, ttl: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(session_key(session_id))
        .arg(principal.as_str())
        .arg("EX")
        .arg(ttl.as_secs().max(1));
    cmd
}

fn scan_cmd(cursor: u64) -> redis::Cmd {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor)
        .arg("MATCH")
        .arg(format!("{}*", KEY_PREFIX))
        .arg("COUNT")
        .arg(SCAN_BATCH);
    cmd
}

fn redis_error(operation: &str, e: redis::RedisError) -> AppError {
    AppError::Persistence(format!("redis {} failed: {}", operation, e))
}

/// Session store backed by Redis keys `session:{id}` holding the principal.
///
/// TTLs are enforced by Redis (`SET .. EX`). `find_by_principal` walks the
/// keyspace with `SCAN`, and `create_exclusive` uses the non-atomic default.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl: Duration,
    op_timeout: Duration,
}

impl RedisSessionStore {
    /// Open a managed connection to `url`; fails if it cannot connect within `op_timeout`.
    pub async fn connect(url: &str, ttl: Duration, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| redis_error("open", e))?;
        let conn = with_deadline(op_timeout, "redis connect", async {
            ConnectionManager::new(client)
                .await
                .map_err(|e| redis_error("connect", e))
        })
        .await?;

        tracing::info!("connected to redis session store");

        Ok(Self {
            conn,
            ttl,
            op_timeout,
        })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, principal: &PrincipalId) -> Result<String> {
        let session_id = generate_session_id();
        let mut conn = self.conn.clone();

        with_deadline(self.op_timeout, "redis set", async {
            set_cmd(&session_id, principal, self.ttl)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| redis_error("SET", e))
        })
        .await?;

        tracing::debug!(principal = %principal, "session created");
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<PrincipalId> {
        let mut conn = self.conn.clone();

        let value = with_deadline(self.op_timeout, "redis get", async {
            redis::cmd("GET")
                .arg(session_key(session_id))
                .query_async::<Option<String>>(&mut conn)
                .await
                .map_err(|e| redis_error("GET", e))
        })
        .await?;

        value.map(PrincipalId).ok_or(AppError::SessionNotFound)
    }

    async fn find_by_principal(&self, principal: &PrincipalId) -> Result<String> {
        let mut conn = self.conn.clone();

        with_deadline(self.op_timeout, "redis scan", async {
            let mut cursor: u64 = 0;
            loop {
                let (next, keys) = scan_cmd(cursor)
                    .query_async::<(u64, Vec<String>)>(&mut conn)
                    .await
                    .map_err(|e| redis_error("SCAN", e))?;

                for key in keys {
                    let owner = redis::cmd("GET")
                        .arg(&key)
                        .query_async::<Option<String>>(&mut conn)
                        .await
                        .map_err(|e| redis_error("GET", e))?;

                    if let Some(id) = owned_session_id(&key, owner.as_deref(), principal) {
                        return Ok(id);
                    }
                }

                if next == 0 {
                    return Err(AppError::SessionNotFound);
                }
                cursor = next;
            }
        })
        .await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        with_deadline(self.op_timeout, "redis del", async {
            redis::cmd("DEL")
                .arg(session_key(session_id))
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| redis_error("DEL", e))
        })
        .await?;

        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
