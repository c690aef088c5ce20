use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::entities::auth_provider::ProviderKind;
use crate::entities::user;
use crate::error::{AppError, AppResult};

/// Lifetime of the admin cookie token.
pub const ADMIN_TOKEN_TTL_SECONDS: i64 = 3600;

/// End-user session, sent as a Bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: i32,        // user id
    pub name: String,
    pub email: String,
    pub provider: ProviderKind,
    pub exp: i64,
    pub iat: i64,
}

/// Admin dashboard token, carried in the `token` cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub id: i32,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_session_token(
    user: &user::Model,
    provider: ProviderKind,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = SessionClaims {
        sub: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        provider,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    sign(&claims, secret)
}

pub fn verify_session_token(token: &str, secret: &str) -> AppResult<SessionClaims> {
    verify(token, secret)
}

pub fn create_admin_token(admin_id: i32, role: &str, secret: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = AdminClaims {
        id: admin_id,
        role: role.to_string(),
        exp: (now + Duration::seconds(ADMIN_TOKEN_TTL_SECONDS)).timestamp(),
        iat: now.timestamp(),
    };

    sign(&claims, secret)
}

pub fn verify_admin_token(token: &str, secret: &str) -> AppResult<AdminClaims> {
    verify(token, secret)
}

fn sign<C: Serialize>(claims: &C, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

fn verify<C: DeserializeOwned>(token: &str, secret: &str) -> AppResult<C> {
    decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
