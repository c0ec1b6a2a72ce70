use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::Movie;

/// A user's recorded interaction with one movie.
///
/// At most one row exists per (user, movie) pair; favorite/rate/comment all
/// upsert into the same row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserAction {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An action row joined with its movie, for profile and preference listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovieAction {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movie: Movie,
    pub rating: Option<f64>,
    pub comment: Option<String>,
    pub is_favorite: bool,
    pub acted_at: DateTime<Utc>,
}

/// Aggregate interaction counts for one user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserStats {
    pub favorite_count: i64,
    pub rated_count: i64,
    pub comment_count: i64,
    pub avg_rating: Option<f64>,
}

/// Clamps a submitted rating into the valid [0, 10] range
pub fn clamp_rating(rating: f64) -> f64 {
    rating.clamp(0.0, 10.0)
}
