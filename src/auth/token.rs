use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

pub const ACCESS_TOKEN_ISSUER: &str = "chirpy-access";

/// Upper bound for any access token lifetime, including client-requested ones.
pub const MAX_ACCESS_TOKEN_TTL: Duration = Duration::hours(1);

const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,  // User ID
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration time
}

/// Signing secret plus the default access token lifetime, shared through
/// the application state.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: String, access_ttl: Duration) -> Self {
        Self {
            secret,
            access_ttl: access_ttl.min(MAX_ACCESS_TOKEN_TTL),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, AuthError> {
        issue_access_token(user_id, &self.secret, self.access_ttl)
    }

    /// `requested` is clamped to the service's lifetime; non-positive values
    /// fall back to it.
    pub fn issue_access_with_ttl(&self, user_id: Uuid, requested: Option<Duration>) -> Result<String, AuthError> {
        let ttl = match requested {
            Some(ttl) if ttl > Duration::zero() => ttl.min(self.access_ttl),
            _ => self.access_ttl,
        };
        issue_access_token(user_id, &self.secret, ttl)
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        validate_access_token(token, &self.secret)
    }
}

pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AuthError::SigningError("access token expiry out of range".into()))?;

    let claims = Claims {
        iss: ACCESS_TOKEN_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::SigningError(e.to_string()))
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    validate_access_token_at(token, secret, Utc::now())
}

pub fn validate_access_token_at(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below against `now`, without the library's leeway
    validation.validate_exp = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    if now.timestamp() >= data.claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)
}

/// 256 bits from the OS RNG, hex encoded. Carries no claims; uniqueness is
/// enforced by the store's primary key.
pub fn issue_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))?;
    Ok(hex::encode(bytes))
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_authorization(headers, "Bearer ")
}

/// The Polka webhook authenticates with `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_authorization(headers, "ApiKey ")
}

fn extract_authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    match value.strip_prefix(scheme) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}
