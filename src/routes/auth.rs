use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth,
    db::{self, users::NewUser},
    error::{AppError, AppResult},
    models::{PublicUser, Sex},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default = "default_sex")]
    pub sex: Sex,
    pub age: Option<i32>,
    pub password1: String,
    pub password2: String,
}

fn default_sex() -> Sex {
    Sex::Male
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
    if request.username.trim().is_empty() {
        return Err(AppError::InvalidInput("username is required".to_string()));
    }
    if request.email.trim().is_empty() {
        return Err(AppError::InvalidInput("email is required".to_string()));
    }
    if request.password1.is_empty() {
        return Err(AppError::InvalidInput("password is required".to_string()));
    }
    if request.password1 != request.password2 {
        return Err(AppError::InvalidInput("passwords do not match".to_string()));
    }
    Ok(())
}

/// Handler for account registration; a fresh token is issued so the caller
/// is logged in immediately.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_registration(&request)?;

    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    if db::users::username_taken(&state.pool, &username, None).await? {
        return Err(AppError::InvalidInput("username already exists".to_string()));
    }
    if db::users::email_taken(&state.pool, &email, None).await? {
        return Err(AppError::InvalidInput("email is already registered".to_string()));
    }

    let user = db::users::create(
        &state.pool,
        &NewUser {
            user_uid: Uuid::new_v4().simple().to_string(),
            username,
            nickname: request.nickname.trim().to_string(),
            email,
            password_hash: auth::hash_password(&request.password1)?,
            sex: request.sex,
            age: request.age,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Account registered");

    let token = auth::issue_token(&state.config.jwt_secret, user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Handler for login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = db::users::by_username(&state.pool, request.username.trim())
        .await?
        .filter(|user| auth::verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| AppError::Unauthorized("invalid username or password".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("account is disabled".to_string()));
    }

    db::users::touch_last_login(&state.pool, user.id).await?;
    let token = auth::issue_token(&state.config.jwt_secret, user.id)?;

    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Handler for logout.
///
/// Tokens are stateless; the endpoint exists so clients have a uniform
/// place to end a session and discard the token.
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "logged out" }))
}
