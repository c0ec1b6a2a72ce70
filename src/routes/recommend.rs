use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthUser, OptionalAuthUser},
    error::AppResult,
    models::{AiRecommendResponse, MovieSummary},
    services::{personalize, recommend},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    /// Whether the items came from the caller's own history rather than the
    /// hot-list fallback
    pub personalized: bool,
    pub items: Vec<MovieSummary>,
}

/// Handler for the recommendation listing.
///
/// Authenticated callers get history-driven personalization when their
/// history supports it; everyone else gets the hot list.
pub async fn recommend(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<RecommendResponse>> {
    let limit = query
        .limit
        .unwrap_or(personalize::DEFAULT_LIMIT)
        .clamp(1, 100);

    let personalized = match user {
        Some(user) => {
            personalize::personalized_recommendations(&state.pool, user.id, limit).await?
        }
        None => None,
    };

    let (personalized_flag, movies) = match personalized {
        Some(movies) => (true, movies),
        None => (false, personalize::hot_list(&state.pool, &state.cache, limit).await?),
    };

    Ok(Json(RecommendResponse {
        personalized: personalized_flag,
        items: movies.iter().map(MovieSummary::from).collect(),
    }))
}

/// Handler for the AI recommendation endpoint.
///
/// Always answers 200 with a structured body; remote failures surface as
/// `success = false` with the raw model text attached when available.
pub async fn ai_recommend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<AiRecommendResponse>> {
    let response = recommend::ai_recommendations(
        &state.pool,
        &state.cache,
        state.provider.as_ref(),
        user.id,
    )
    .await?;

    Ok(Json(response))
}
