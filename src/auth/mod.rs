//! Credential handling and request authentication.
//!
//! Passwords are hashed with argon2; sessions are stateless bearer tokens
//! signed with the configured secret. Handlers take [`AuthUser`] when a
//! logged-in principal is required, or [`OptionalAuthUser`] when the
//! response is merely personalized for logged-in callers.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    db,
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Hashes a password for storage
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verifies a candidate password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Issues a signed bearer token for a user
pub fn issue_token(secret: &str, user_id: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

/// Decodes and validates a bearer token, returning the user id
pub fn verify_token(secret: &str, token: &str) -> AppResult<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;
    Ok(data.claims.sub)
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn load_principal(state: &AppState, parts: &Parts) -> AppResult<User> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let user_id = verify_token(&state.config.jwt_secret, &token)?;

    let user = db::users::by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("account is disabled".to_string()));
    }

    Ok(user)
}

/// An authenticated principal; rejects the request when absent or invalid
pub struct AuthUser(pub User);

/// The authenticated principal when present; `None` for anonymous callers
pub struct OptionalAuthUser(pub Option<User>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = load_principal(&app_state, parts).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(OptionalAuthUser(None));
        }

        // A token was presented; a bad one is rejected rather than treated
        // as anonymous.
        let app_state = AppState::from_ref(state);
        let user = load_principal(&app_state, parts).await?;
        Ok(OptionalAuthUser(Some(user)))
    }
}
