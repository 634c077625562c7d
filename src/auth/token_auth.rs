use crate::auth::jwt::TokenEngine;
use crate::auth::ledger::Ledger;
use crate::auth::password::check_credentials;
use crate::db::traits::UserDirectory;
use crate::types::{AppError, Claims, PrincipalId, Result, TokenPair, TokenType};
use async_trait::async_trait;
use std::sync::Arc;

/// Login, rotation and logout for the signed-token scheme.
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    /// Verify credentials and issue a fresh pair, superseding any earlier
    /// refresh token of the same principal.
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair>;

    /// Exchange a refresh token for a new pair. Each refresh token can be
    /// exchanged once.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;

    /// Revoke the principal's refresh token. Idempotent.
    async fn logout(&self, principal: &PrincipalId) -> Result<()>;

    /// Validate an access token for the token gate. Never mutates state.
    fn authenticate(&self, access_token: &str) -> Result<Claims>;
}

/// [`TokenAuthenticator`] built on the signed-token engine and the ledger.
pub struct JwtTokenAuthenticator {
    engine: Arc<TokenEngine>,
    ledger: Arc<dyn Ledger>,
    users: Arc<dyn UserDirectory>,
}

impl JwtTokenAuthenticator {
    /// Wire the engine, ledger and user directory together.
    pub fn new(
        engine: Arc<TokenEngine>,
        ledger: Arc<dyn Ledger>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            engine,
            ledger,
            users,
        }
    }

    async fn issue_and_record(&self, subject: &PrincipalId) -> Result<TokenPair> {
        let pair = self.engine.issue_pair(subject)?;
        self.ledger.save(&pair.refresh_token).await?;
        Ok(pair)
    }
}

#[async_trait]
impl TokenAuthenticator for JwtTokenAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let user = match check_credentials(self.users.as_ref(), username, password).await {
            Ok(user) => user,
            Err(e) => {
                if e.is_auth_failure() {
                    tracing::warn!("token login rejected");
                }
                return Err(e);
            }
        };

        let pair = self.issue_and_record(&user.id).await?;
        tracing::info!(principal = %user.id, "token login succeeded");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.engine.validate(refresh_token, TokenType::Refresh)?;

        if !self.ledger.exists(refresh_token).await? {
            tracing::warn!(principal = %claims.sub, "refresh with unrecognized token");
            return Err(AppError::TokenNotRecognized);
        }

        // Compare-and-delete: of two concurrent exchanges only one matches.
        self.ledger.consume(&claims.sub, refresh_token).await?;

        let pair = self.issue_and_record(&claims.sub).await?;
        tracing::info!(principal = %claims.sub, "refresh token rotated");
        Ok(pair)
    }

    async fn logout(&self, principal: &PrincipalId) -> Result<()> {
        self.ledger.revoke(principal).await?;
        tracing::info!(principal = %principal, "token logout");
        Ok(())
    }

    fn authenticate(&self, access_token: &str) -> Result<Claims> {
        self.engine.validate(access_token, TokenType::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ledger::{MockLedger, RefreshTokenLedger};
    use crate::auth::password::hash_password;
    use crate::db::TursoClient;
    use chrono::Duration;

    const SECRET: &[u8] = b"token-auth-test-secret-32-bytes-long";

    async fn setup() -> (JwtTokenAuthenticator, Arc<TokenEngine>, PrincipalId) {
        let engine = Arc::new(TokenEngine::new(
            SECRET,
            Duration::minutes(15),
            Duration::days(30),
        ));
        let db = Arc::new(TursoClient::new_memory().await.unwrap());
        let user = db
            .create_user("alice", &hash_password("wonderland").unwrap(), None)
            .await
            .unwrap();
        let ledger = Arc::new(RefreshTokenLedger::new(
            engine.clone(),
            db.clone(),
            std::time::Duration::from_secs(2),
        ));

        (
            JwtTokenAuthenticator::new(engine.clone(), ledger, db),
            engine,
            user.id,
        )
    }

    #[tokio::test]
    async fn test_login_issues_valid_pair() {
        let (auth, _, principal) = setup().await;

        let pair = auth.login("alice", "wonderland").await.unwrap();

        let claims = auth.authenticate(&pair.access_token).unwrap();
        assert_eq!(claims.sub, principal);
        assert_eq!(pair.expires_in, 900);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (auth, _, _) = setup().await;

        assert!(matches!(
            auth.login("alice", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "wonderland").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_old_token_is_dead() {
        let (auth, _, principal) = setup().await;
        let first = auth.login("alice", "wonderland").await.unwrap();

        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(auth.authenticate(&second.access_token).unwrap().sub, principal);

        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(AppError::TokenNotRecognized)
        ));
        assert!(auth.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first() {
        let (auth, _, _) = setup().await;
        let first = auth.login("alice", "wonderland").await.unwrap();
        let second = auth.login("alice", "wonderland").await.unwrap();

        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(AppError::TokenNotRecognized)
        ));
        assert!(auth.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let (auth, _, principal) = setup().await;
        let pair = auth.login("alice", "wonderland").await.unwrap();

        auth.logout(&principal).await.unwrap();
        auth.logout(&principal).await.unwrap();

        assert!(matches!(
            auth.refresh(&pair.refresh_token).await,
            Err(AppError::TokenNotRecognized)
        ));
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let (auth, _, _) = setup().await;
        let pair = auth.login("alice", "wonderland").await.unwrap();

        assert!(matches!(
            auth.refresh(&pair.access_token).await,
            Err(AppError::TokenTypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authenticate() {
        let (auth, _, _) = setup().await;
        let pair = auth.login("alice", "wonderland").await.unwrap();

        assert!(matches!(
            auth.authenticate(&pair.refresh_token),
            Err(AppError::TokenTypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_with_same_token_succeeds_once() {
        let (auth, _, _) = setup().await;
        let auth = Arc::new(auth);
        let pair = auth.login("alice", "wonderland").await.unwrap();

        let a = {
            let auth = auth.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { auth.refresh(&token).await })
        };
        let b = {
            let auth = auth.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { auth.refresh(&token).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_does_not_touch_ledger_for_invalid_token() {
        let engine = Arc::new(TokenEngine::new(
            SECRET,
            Duration::minutes(15),
            Duration::days(30),
        ));
        let mut ledger = MockLedger::new();
        ledger.expect_exists().never();
        ledger.expect_consume().never();
        let db = Arc::new(TursoClient::new_memory().await.unwrap());

        let auth = JwtTokenAuthenticator::new(engine, Arc::new(ledger), db);

        assert!(matches!(
            auth.refresh("not-a-jwt").await,
            Err(AppError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_failure_propagates_from_refresh() {
        let engine = Arc::new(TokenEngine::new(
            SECRET,
            Duration::minutes(15),
            Duration::days(30),
        ));
        let token = engine
            .issue(&PrincipalId::new("u"), TokenType::Refresh, Duration::days(1))
            .unwrap();
        let mut ledger = MockLedger::new();
        ledger
            .expect_exists()
            .returning(|_| Err(AppError::Persistence("locked".to_string())));
        let db = Arc::new(TursoClient::new_memory().await.unwrap());

        let auth = JwtTokenAuthenticator::new(engine, Arc::new(ledger), db);

        assert!(matches!(
            auth.refresh(&token).await,
            Err(AppError::Persistence(_))
        ));
    }
}
