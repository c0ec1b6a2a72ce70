use sqlx::{FromRow, PgPool};

use crate::{
    error::AppResult,
    models::{MovieAction, UserAction, UserStats},
};

/// Movie attributes needed by the personalization scorer, joined from the
/// user's recent action history.
#[derive(Debug, Clone, FromRow)]
pub struct InteractedMovie {
    pub movie_id: i64,
    pub category: Option<String>,
    pub actors: Option<String>,
}

/// The user's action row for one movie, if any
pub async fn for_user_movie(pool: &PgPool, user_id: i64, movie_id: i64) -> AppResult<Option<UserAction>> {
    let action = sqlx::query_as::<_, UserAction>(
        "SELECT * FROM user_actions WHERE user_id = $1 AND movie_id = $2",
    )
    .bind(user_id)
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;
    Ok(action)
}

/// Flips the favorite flag, creating the action row on first touch.
///
/// The (user_id, movie_id) unique constraint resolves concurrent first-write
/// races: whichever request wins the insert, the other lands in the UPDATE
/// arm. Returns the new flag value.
pub async fn toggle_favorite(pool: &PgPool, user_id: i64, movie_id: i64) -> AppResult<bool> {
    let is_favorite: bool = sqlx::query_scalar(
        "INSERT INTO user_actions (user_id, movie_id, is_favorite)
         VALUES ($1, $2, TRUE)
         ON CONFLICT (user_id, movie_id) DO UPDATE
             SET is_favorite = NOT user_actions.is_favorite, updated_at = now()
         RETURNING is_favorite",
    )
    .bind(user_id)
    .bind(movie_id)
    .fetch_one(pool)
    .await?;
    Ok(is_favorite)
}

/// Stores a rating (already clamped by the caller), upserting the action row
pub async fn set_rating(pool: &PgPool, user_id: i64, movie_id: i64, rating: f64) -> AppResult<f64> {
    let stored: f64 = sqlx::query_scalar(
        "INSERT INTO user_actions (user_id, movie_id, rating)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, movie_id) DO UPDATE
             SET rating = EXCLUDED.rating, updated_at = now()
         RETURNING rating",
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(rating)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Stores a comment, upserting the action row
pub async fn set_comment(pool: &PgPool, user_id: i64, movie_id: i64, comment: &str) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO user_actions (user_id, movie_id, comment)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, movie_id) DO UPDATE
             SET comment = EXCLUDED.comment, updated_at = now()",
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(comment)
    .execute(pool)
    .await?;
    Ok(())
}

/// The user's most recent interactions joined with movie signal fields,
/// newest first, for the personalization scorer.
pub async fn recent_interactions(pool: &PgPool, user_id: i64, limit: i64) -> AppResult<Vec<InteractedMovie>> {
    let rows = sqlx::query_as::<_, InteractedMovie>(
        "SELECT m.id AS movie_id, m.category, m.actors
         FROM user_actions a
         JOIN movies m ON m.id = a.movie_id
         WHERE a.user_id = $1
         ORDER BY a.updated_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Favorited movies with the user's action data, newest first
pub async fn favorites(pool: &PgPool, user_id: i64, limit: i64) -> AppResult<Vec<MovieAction>> {
    let rows = sqlx::query_as::<_, MovieAction>(
        "SELECT m.*, a.rating, a.comment, a.is_favorite, a.updated_at AS acted_at
         FROM user_actions a
         JOIN movies m ON m.id = a.movie_id
         WHERE a.user_id = $1 AND a.is_favorite
         ORDER BY a.updated_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Rated movies with the user's action data, newest first (profile listing)
pub async fn rated(pool: &PgPool, user_id: i64, limit: i64) -> AppResult<Vec<MovieAction>> {
    let rows = sqlx::query_as::<_, MovieAction>(
        "SELECT m.*, a.rating, a.comment, a.is_favorite, a.updated_at AS acted_at
         FROM user_actions a
         JOIN movies m ON m.id = a.movie_id
         WHERE a.user_id = $1 AND a.rating IS NOT NULL
         ORDER BY a.updated_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// The user's highest-rated movies, for summarizing taste to the model
pub async fn top_rated(pool: &PgPool, user_id: i64, limit: i64) -> AppResult<Vec<MovieAction>> {
    let rows = sqlx::query_as::<_, MovieAction>(
        "SELECT m.*, a.rating, a.comment, a.is_favorite, a.updated_at AS acted_at
         FROM user_actions a
         JOIN movies m ON m.id = a.movie_id
         WHERE a.user_id = $1 AND a.rating IS NOT NULL
         ORDER BY a.rating DESC, a.updated_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Aggregate interaction counts for the profile stats endpoint
pub async fn stats(pool: &PgPool, user_id: i64) -> AppResult<UserStats> {
    let stats = sqlx::query_as::<_, UserStats>(
        "SELECT
             COUNT(*) FILTER (WHERE is_favorite) AS favorite_count,
             COUNT(rating) AS rated_count,
             COUNT(comment) FILTER (WHERE comment <> '') AS comment_count,
             AVG(rating) AS avg_rating
         FROM user_actions
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
