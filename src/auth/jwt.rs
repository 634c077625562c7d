use crate::types::{AppError, Claims, PrincipalId, Result, TokenPair, TokenType};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sha2::{Digest, Sha256};

/// Signed-token engine for access and refresh tokens.
///
/// Tokens are HS256 JWTs whose claims carry the subject, the token type and
/// the expiry. The secret is fixed for the lifetime of the engine.
pub struct TokenEngine {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenEngine {
    /// Creates a new engine.
    ///
    /// # Arguments
    /// * `secret` - HMAC key (at least 32 bytes; enforced by config validation)
    /// * `access_ttl` - lifetime of access tokens
    /// * `refresh_ttl` - lifetime of refresh tokens
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked after the type check, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Lifetime of access tokens.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Lifetime of refresh tokens.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a token of `token_type` for `subject`, expiring at `now + ttl`.
    pub fn issue(&self, subject: &PrincipalId, token_type: TokenType, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Signing(format!("{} token lifetime out of range", token_type))
        })?;
        let claims = Claims {
            sub: subject.clone(),
            token_type,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Signing(format!("Failed to sign {} token: {}", token_type, e)))
    }

    /// Issue an access/refresh pair with the configured lifetimes.
    pub fn issue_pair(&self, subject: &PrincipalId) -> Result<TokenPair> {
        let access_token = self.issue(subject, TokenType::Access, self.access_ttl)?;
        let refresh_token = self.issue(subject, TokenType::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verify signature and algorithm, then the type, then the expiry.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AppError::InvalidToken("bad signature".to_string()),
                ErrorKind::InvalidAlgorithm => AppError::InvalidToken("wrong algorithm".to_string()),
                _ => AppError::InvalidToken(e.to_string()),
            })?;

        if claims.token_type != expected {
            return Err(AppError::TokenTypeMismatch {
                expected,
                found: claims.token_type,
            });
        }

        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::Expired);
        }

        Ok(claims)
    }
}

/// SHA-256 hex digest of a token, the form in which refresh tokens are stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
