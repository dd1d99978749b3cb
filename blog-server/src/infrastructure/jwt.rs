use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("jwt signing secret is not configured")]
    MissingSecret,

    #[error("token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token is malformed or its signature is invalid")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("token ttl out of range: {0} seconds")]
    TtlOutOfRange(i64),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Claims {
    #[serde(rename = "userId")]
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

#[derive(Clone)]
pub(crate) struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    pub(crate) const DEFAULT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
    pub(crate) const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Result<Self, JwtError> {
        if secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };
        let ttl = Some(ttl_seconds)
            .filter(|secs| *secs <= Self::MAX_TTL_SECONDS)
            .and_then(Duration::try_seconds)
            .ok_or(JwtError::TtlOutOfRange(ttl_seconds))?;

        Ok(JwtService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub(crate) fn generate_token(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        self.generate_token_at(user_id, username, Utc::now())
    }

    pub(crate) fn generate_token_at(
        &self,
        user_id: i64,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(JwtError::TtlOutOfRange(self.ttl.num_seconds()))?;
        let claims = Claims {
            user_id,
            username: username.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encode)
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_token_at(token, Utc::now())
    }

    /// Checks the signature, then rejects the token once `now >= exp`.
    pub(crate) fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against `now` below so callers control the clock
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Malformed)?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}
