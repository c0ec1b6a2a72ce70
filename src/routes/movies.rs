use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::OptionalAuthUser,
    cached,
    db::{self, movies::MovieFilter, movies::Sort, movies::PAGE_SIZE, CacheKey},
    error::{AppError, AppResult},
    models::{Movie, MovieSummary, UserAction},
    state::AppState,
};

const FACET_LIMIT: i64 = 30;
const FACET_TTL: u64 = 600;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub region: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
}

/// Distinct filter values offered alongside catalog pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facets {
    pub regions: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MoviePage {
    pub items: Vec<MovieSummary>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub sort: &'static str,
    #[serde(flatten)]
    pub facets: Facets,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub top_rated: Vec<MovieSummary>,
    pub latest: Vec<MovieSummary>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub movie: Movie,
    pub related: Vec<MovieSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<UserAction>,
}

fn summaries(movies: &[Movie]) -> Vec<MovieSummary> {
    movies.iter().map(MovieSummary::from).collect()
}

fn total_pages(total: i64) -> i64 {
    (total + PAGE_SIZE - 1) / PAGE_SIZE
}

async fn load_facets(state: &AppState) -> AppResult<Facets> {
    cached!(state.cache, CacheKey::Facets, FACET_TTL, async {
        Ok::<_, AppError>(Facets {
            regions: db::movies::distinct_regions(&state.pool, FACET_LIMIT).await?,
            categories: db::movies::distinct_categories(&state.pool, FACET_LIMIT).await?,
        })
    })
}

/// Handler for the landing page data
pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomeResponse>> {
    let top_rated = db::movies::hot(&state.pool, 8).await?;
    let latest = db::movies::latest(&state.pool, 8).await?;
    Ok(Json(HomeResponse {
        top_rated: summaries(&top_rated),
        latest: summaries(&latest),
    }))
}

/// Handler for the browse/search endpoint
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<MoviePage>> {
    let filter = MovieFilter {
        keyword: query.q,
        region: query.region,
        category: query.category,
    };
    let sort = Sort::from_param(query.sort.as_deref());
    let page = query.page.unwrap_or(1).max(1);

    let (movies, total) = db::movies::list(&state.pool, &filter, sort, page).await?;
    let facets = load_facets(&state).await?;

    Ok(Json(MoviePage {
        items: summaries(&movies),
        page,
        total_pages: total_pages(total),
        total,
        sort: sort.as_param(),
        facets,
    }))
}

/// Handler for the score-ordered top list
pub async fn top(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> AppResult<Json<MoviePage>> {
    let filter = MovieFilter {
        keyword: None,
        region: query.region,
        category: query.category,
    };
    let page = query.page.unwrap_or(1).max(1);

    let (movies, total) = db::movies::list(&state.pool, &filter, Sort::ScoreDesc, page).await?;
    let facets = load_facets(&state).await?;

    Ok(Json(MoviePage {
        items: summaries(&movies),
        page,
        total_pages: total_pages(total),
        total,
        sort: Sort::ScoreDesc.as_param(),
        facets,
    }))
}

/// Handler for the movie detail endpoint
pub async fn detail(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<DetailResponse>> {
    let movie = db::movies::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {} not found", id)))?;

    let related = db::movies::related(&state.pool, movie.category.as_deref(), id, 6).await?;

    let action = match user {
        Some(user) => db::actions::for_user_movie(&state.pool, user.id, id).await?,
        None => None,
    };

    Ok(Json(DetailResponse {
        movie,
        related: summaries(&related),
        action,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(12), 1);
        assert_eq!(total_pages(13), 2);
        assert_eq!(total_pages(24), 2);
    }
}
