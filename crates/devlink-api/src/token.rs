use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use devlink_types::api::{Claims, Identity};

/// Tokens expire 10 hours after issuance.
pub const TOKEN_TTL_SECS: i64 = 36_000;

#[derive(Debug, Error)]
#[error("invalid token: {0}")]
pub struct InvalidToken(#[from] jsonwebtoken::errors::Error);

/// HS256 signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            user: Identity { id: user_id },
            iat: issued_at.timestamp().max(0) as usize,
            exp: (issued_at + Duration::seconds(TOKEN_TTL_SECS)).timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, InvalidToken> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims.user)
    }
}
