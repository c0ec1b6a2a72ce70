use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account sex flag, stored as a smallint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male = 1,
    Female = 2,
}

/// A registered account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub user_uid: String,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub sex: Sex,
    pub age: Option<i32>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// The user representation exposed over the API (no credential material)
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub user_uid: String,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub sex: Sex,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            user_uid: user.user_uid.clone(),
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            sex: user.sex,
            age: user.age,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}
