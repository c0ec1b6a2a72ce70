use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    auth::{self, AuthUser},
    db::{self, users::ProfileUpdate},
    error::{AppError, AppResult},
    models::{MovieAction, PublicUser, Sex, UserStats},
    state::AppState,
};

const PROFILE_LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
    pub favorites: Vec<MovieAction>,
    pub rated: Vec<MovieAction>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    pub email: String,
    pub sex: Sex,
    pub age: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Handler for the profile page data
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let favorites = db::actions::favorites(&state.pool, user.id, PROFILE_LIST_LIMIT).await?;
    let rated = db::actions::rated(&state.pool, user.id, PROFILE_LIST_LIMIT).await?;

    Ok(Json(ProfileResponse {
        user: PublicUser::from(&user),
        favorites,
        rated,
    }))
}

/// Handler for profile edits; username/email must stay unique among other
/// accounts.
pub async fn edit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<EditRequest>,
) -> AppResult<Json<PublicUser>> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    if username.is_empty() {
        return Err(AppError::InvalidInput("username is required".to_string()));
    }
    if email.is_empty() {
        return Err(AppError::InvalidInput("email is required".to_string()));
    }
    if db::users::username_taken(&state.pool, &username, Some(user.id)).await? {
        return Err(AppError::InvalidInput(
            "username is already in use by another account".to_string(),
        ));
    }
    if db::users::email_taken(&state.pool, &email, Some(user.id)).await? {
        return Err(AppError::InvalidInput(
            "email is already registered to another account".to_string(),
        ));
    }

    let updated = db::users::update_profile(
        &state.pool,
        user.id,
        &ProfileUpdate {
            username,
            nickname: request.nickname.trim().to_string(),
            email,
            sex: request.sex,
            age: request.age,
        },
    )
    .await?;

    Ok(Json(PublicUser::from(&updated)))
}

/// Handler for password changes; the old password must verify first
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<PasswordRequest>,
) -> AppResult<Json<Value>> {
    if !auth::verify_password(&request.old_password, &user.password_hash) {
        return Err(AppError::InvalidInput("current password is incorrect".to_string()));
    }
    if request.new_password1.is_empty() {
        return Err(AppError::InvalidInput("new password is required".to_string()));
    }
    if request.new_password1 != request.new_password2 {
        return Err(AppError::InvalidInput("passwords do not match".to_string()));
    }

    let password_hash = auth::hash_password(&request.new_password1)?;
    db::users::update_password(&state.pool, user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password updated");

    Ok(Json(json!({ "message": "password updated" })))
}

/// Handler for the interaction stats endpoint
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<UserStats>> {
    let stats = db::actions::stats(&state.pool, user.id).await?;
    Ok(Json(stats))
}
