use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AuthUser,
    db,
    error::{AppError, AppResult},
    models::clamp_rating,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: Value,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

async fn require_movie(state: &AppState, id: i64) -> AppResult<()> {
    if db::movies::get(&state.pool, id).await?.is_none() {
        return Err(AppError::NotFound(format!("movie {} not found", id)));
    }
    Ok(())
}

/// Handler for favorite toggling
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_movie(&state, id).await?;

    let is_favorite = db::actions::toggle_favorite(&state.pool, user.id, id).await?;
    tracing::debug!(user_id = user.id, movie_id = id, is_favorite, "Favorite toggled");

    Ok(Json(json!({ "is_favorite": is_favorite })))
}

/// Accepts a rating as a JSON number or a numeric string; form clients post
/// strings. Anything else is a 400.
fn parse_rating(raw: &Value) -> AppResult<f64> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AppError::InvalidInput("invalid rating".to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::InvalidInput("invalid rating".to_string())),
        _ => Err(AppError::InvalidInput("invalid rating".to_string())),
    }
}

/// Handler for rating submission
pub async fn rate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<Value>> {
    require_movie(&state, id).await?;

    let rating = clamp_rating(parse_rating(&request.rating)?);
    let stored = db::actions::set_rating(&state.pool, user.id, id, rating).await?;

    Ok(Json(json!({ "rating": stored })))
}

/// Handler for comment submission
pub async fn comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> AppResult<Json<Value>> {
    require_movie(&state, id).await?;

    let text = request.comment.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("comment cannot be empty".to_string()));
    }

    db::actions::set_comment(&state.pool, user.id, id, text).await?;

    Ok(Json(json!({ "comment": text })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_number() {
        assert_eq!(parse_rating(&json!(7.5)).unwrap(), 7.5);
    }

    #[test]
    fn test_parse_rating_numeric_string() {
        assert_eq!(parse_rating(&json!("8")).unwrap(), 8.0);
    }

    #[test]
    fn test_parse_rating_rejects_garbage() {
        assert!(parse_rating(&json!("high")).is_err());
        assert!(parse_rating(&json!(null)).is_err());
        assert!(parse_rating(&json!([1])).is_err());
    }

    #[test]
    fn test_rating_is_clamped() {
        assert_eq!(clamp_rating(parse_rating(&json!(15)).unwrap()), 10.0);
        assert_eq!(clamp_rating(parse_rating(&json!(-3)).unwrap()), 0.0);
        assert_eq!(clamp_rating(parse_rating(&json!(7.5)).unwrap()), 7.5);
    }
}
