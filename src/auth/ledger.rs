use crate::auth::jwt::{hash_token, TokenEngine};
use crate::db::traits::RefreshTokenRepository;
use crate::types::{AppError, Claims, PrincipalId, RefreshTokenRecord, Result, TokenType};
use crate::utils::deadline::with_deadline;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Durable record of the one outstanding refresh token per principal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Record `token` as its subject's outstanding refresh token, replacing any
    /// prior one. Subject and expiry are read from the token itself.
    async fn save(&self, token: &str) -> Result<Claims>;

    /// Whether `token` is the one on record.
    async fn exists(&self, token: &str) -> Result<bool>;

    /// Drop the principal's record. Missing records are not an error.
    async fn revoke(&self, principal: &PrincipalId) -> Result<()>;

    /// Fails with `NotFound` if the principal has no record.
    async fn get(&self, principal: &PrincipalId) -> Result<RefreshTokenRecord>;

    /// Remove the principal's record only if it still holds `token`.
    ///
    /// Fails with `TokenNotRecognized` when the record is gone or belongs to a
    /// newer token.
    async fn consume(&self, principal: &PrincipalId, token: &str) -> Result<()>;
}

/// [`Ledger`] over a [`RefreshTokenRepository`], storing SHA-256 digests.
pub struct RefreshTokenLedger {
    engine: Arc<TokenEngine>,
    repo: Arc<dyn RefreshTokenRepository>,
    op_timeout: Duration,
}

impl RefreshTokenLedger {
    /// Every repository call is bounded by `op_timeout`.
    pub fn new(
        engine: Arc<TokenEngine>,
        repo: Arc<dyn RefreshTokenRepository>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            repo,
            op_timeout,
        }
    }
}

#[async_trait]
impl Ledger for RefreshTokenLedger {
    async fn save(&self, token: &str) -> Result<Claims> {
        let claims = self.engine.validate(token, TokenType::Refresh)?;
        let token_hash = hash_token(token);

        with_deadline(
            self.op_timeout,
            "ledger save",
            self.repo
                .insert_refresh_token(&claims.sub, &token_hash, claims.exp),
        )
        .await?;

        Ok(claims)
    }

    async fn exists(&self, token: &str) -> Result<bool> {
        let token_hash = hash_token(token);

        let count = with_deadline(
            self.op_timeout,
            "ledger exists",
            self.repo.row_count_for_token(&token_hash),
        )
        .await?;

        Ok(count > 0)
    }

    async fn revoke(&self, principal: &PrincipalId) -> Result<()> {
        let removed = with_deadline(
            self.op_timeout,
            "ledger revoke",
            self.repo.delete_refresh_token_by_user(principal),
        )
        .await?;

        tracing::debug!(principal = %principal, removed, "refresh token revoked");
        Ok(())
    }

    async fn get(&self, principal: &PrincipalId) -> Result<RefreshTokenRecord> {
        with_deadline(
            self.op_timeout,
            "ledger get",
            self.repo.get_refresh_token(principal),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no refresh token for {}", principal)))
    }

    async fn consume(&self, principal: &PrincipalId, token: &str) -> Result<()> {
        let token_hash = hash_token(token);

        let matched = with_deadline(
            self.op_timeout,
            "ledger consume",
            self.repo
                .delete_refresh_token_if_matches(principal, &token_hash),
        )
        .await?;

        if matched {
            Ok(())
        } else {
            Err(AppError::TokenNotRecognized)
        }
    }
}
