//! Per-operation deadlines for calls into the ledger and session stores.

use crate::types::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Run `fut` under `limit`. An elapsed deadline maps to [`AppError::Cancelled`]
/// naming `operation`; the inner future is dropped.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "deadline exceeded");
            Err(AppError::Cancelled(operation.to_string()))
        }
    }
}
