use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{Sex, User},
};

/// Fields required to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_uid: String,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub sex: Sex,
    pub age: Option<i32>,
}

/// Profile fields a user may edit about themselves
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub sex: Sex,
    pub age: Option<i32>,
}

/// Inserts a new account row
pub async fn create(pool: &PgPool, user: &NewUser) -> AppResult<User> {
    let created = sqlx::query_as::<_, User>(
        "INSERT INTO users (user_uid, username, nickname, email, password_hash, sex, age)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(&user.user_uid)
    .bind(&user.username)
    .bind(&user.nickname)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.sex)
    .bind(user.age)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn by_id(pool: &PgPool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn by_username(pool: &PgPool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Whether a username is taken, optionally excluding one account (for
/// profile edits).
pub async fn username_taken(pool: &PgPool, username: &str, exclude_id: Option<i64>) -> AppResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(username)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Whether an email is registered, optionally excluding one account
pub async fn email_taken(pool: &PgPool, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Stamps a successful login
pub async fn touch_last_login(pool: &PgPool, id: i64) -> AppResult<()> {
    sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies a profile edit
pub async fn update_profile(pool: &PgPool, id: i64, update: &ProfileUpdate) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users
         SET username = $2, nickname = $3, email = $4, sex = $5, age = $6
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&update.username)
    .bind(&update.nickname)
    .bind(&update.email)
    .bind(update.sex)
    .bind(update.age)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Replaces the stored password hash
pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> AppResult<()> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}
