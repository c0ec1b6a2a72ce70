use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod actions;
pub mod auth;
pub mod movies;
pub mod profile;
pub mod recommend;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/home", get(movies::home))
        .route("/movies", get(movies::list))
        .route("/movies/top", get(movies::top))
        .route("/movies/:id", get(movies::detail))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // User actions
        .route("/movies/:id/favorite", post(actions::toggle_favorite))
        .route("/movies/:id/rate", post(actions::rate))
        .route("/movies/:id/comment", post(actions::comment))
        // Recommendations
        .route("/recommend", get(recommend::recommend))
        .route("/recommend/ai", get(recommend::ai_recommend))
        // Account
        .route("/profile", get(profile::show))
        .route("/profile", put(profile::edit))
        .route("/profile/password", post(profile::change_password))
        .route("/profile/stats", get(profile::stats))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
