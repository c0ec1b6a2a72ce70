use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{Movie, NewMovie},
};

/// Catalog page size used by the list and top endpoints
pub const PAGE_SIZE: i64 = 12;

/// Whitelisted catalog orderings; both are descending.
///
/// Unknown sort parameters fall back to newest-first, matching the browse
/// page default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    DateDesc,
    ScoreDesc,
}

impl Sort {
    /// Parses a `sort` query parameter, falling back to [`Sort::DateDesc`].
    ///
    /// The prefixed forms (`-score`, `-date`) are accepted as aliases.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("score") | Some("-score") => Sort::ScoreDesc,
            _ => Sort::DateDesc,
        }
    }

    /// The query parameter form, echoed back in list responses
    pub fn as_param(&self) -> &'static str {
        match self {
            Sort::DateDesc => "date",
            Sort::ScoreDesc => "score",
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            Sort::DateDesc => "date DESC NULLS LAST, id DESC",
            Sort::ScoreDesc => "score DESC NULLS LAST, id DESC",
        }
    }
}

/// Filters for the browse endpoint
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
}

/// Escapes LIKE wildcards so user input matches literally
fn like_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", like_escape(value))
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &MovieFilter) {
    builder.push(" WHERE TRUE");
    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        let pattern = contains_pattern(keyword.trim());
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR actors ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR summary ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(region) = filter.region.as_deref().filter(|r| !r.trim().is_empty()) {
        builder
            .push(" AND region ILIKE ")
            .push_bind(contains_pattern(region.trim()));
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
        builder
            .push(" AND category ILIKE ")
            .push_bind(contains_pattern(category.trim()));
    }
}

/// Lists a catalog page under the given filters and ordering.
///
/// Returns the page rows and the total row count for pagination.
pub async fn list(
    pool: &PgPool,
    filter: &MovieFilter,
    sort: Sort,
    page: i64,
) -> AppResult<(Vec<Movie>, i64)> {
    let page = page.max(1);

    let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies");
    push_filters(&mut count_builder, filter);
    let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM movies");
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY ").push(sort.order_clause());
    builder
        .push(" LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind((page - 1) * PAGE_SIZE);

    let movies = builder.build_query_as::<Movie>().fetch_all(pool).await?;
    Ok((movies, total))
}

/// Fetches a single movie by id
pub async fn get(pool: &PgPool, id: i64) -> AppResult<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(movie)
}

/// Movies sharing the exact category string, for the detail page
pub async fn related(pool: &PgPool, category: Option<&str>, exclude_id: i64, limit: i64) -> AppResult<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies
         WHERE category IS NOT DISTINCT FROM $1 AND id <> $2
         ORDER BY score DESC NULLS LAST
         LIMIT $3",
    )
    .bind(category)
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(movies)
}

/// Catalog ordered by score, newest first among ties
pub async fn hot(pool: &PgPool, limit: i64) -> AppResult<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies
         ORDER BY score DESC NULLS LAST, date DESC NULLS LAST
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(movies)
}

/// Most recently released movies
pub async fn latest(pool: &PgPool, limit: i64) -> AppResult<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies ORDER BY date DESC NULLS LAST LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(movies)
}

/// Distinct non-empty region values, for the browse filter facets
pub async fn distinct_regions(pool: &PgPool, limit: i64) -> AppResult<Vec<String>> {
    let regions = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT region FROM movies
         WHERE region IS NOT NULL AND region <> ''
         ORDER BY region
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(regions)
}

/// Distinct non-empty category values, for the browse filter facets
pub async fn distinct_categories(pool: &PgPool, limit: i64) -> AppResult<Vec<String>> {
    let categories = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM movies
         WHERE category IS NOT NULL AND category <> ''
         ORDER BY category
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

/// Exact-title lookup for cross-referencing model suggestions
pub async fn by_exact_title(pool: &PgPool, title: &str) -> AppResult<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies WHERE title = $1 ORDER BY score DESC NULLS LAST LIMIT 1",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;
    Ok(movie)
}

/// Substring-title fallback lookup for cross-referencing model suggestions
pub async fn by_title_substring(pool: &PgPool, title: &str) -> AppResult<Option<Movie>> {
    let movie = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies WHERE title ILIKE $1 ORDER BY score DESC NULLS LAST LIMIT 1",
    )
    .bind(contains_pattern(title))
    .fetch_optional(pool)
    .await?;
    Ok(movie)
}

/// Movies whose category or actors contain any of the given tokens,
/// excluding the ids the user already interacted with.
///
/// Token matching is case-insensitive substring, mirroring the browse
/// filters. Ordered by score then date, both descending.
pub async fn personalized(
    pool: &PgPool,
    category_tokens: &[String],
    actor_tokens: &[String],
    exclude_ids: &[i64],
    limit: i64,
) -> AppResult<Vec<Movie>> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM movies WHERE (FALSE");
    for token in category_tokens {
        builder
            .push(" OR category ILIKE ")
            .push_bind(contains_pattern(token));
    }
    for token in actor_tokens {
        builder
            .push(" OR actors ILIKE ")
            .push_bind(contains_pattern(token));
    }
    builder.push(")");

    if !exclude_ids.is_empty() {
        builder
            .push(" AND id <> ALL(")
            .push_bind(exclude_ids.to_vec())
            .push(")");
    }

    builder
        .push(" ORDER BY score DESC NULLS LAST, date DESC NULLS LAST LIMIT ")
        .push_bind(limit);

    let movies = builder.build_query_as::<Movie>().fetch_all(pool).await?;
    Ok(movies)
}

/// Upserts one loader record on the (title, date) unique index.
///
/// Re-running the loader over the same export refreshes metadata instead of
/// duplicating rows.
pub async fn upsert(pool: &PgPool, movie: &NewMovie) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO movies (title, score, date, poster, actors, region, category, summary)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (title, COALESCE(date, DATE '0001-01-01')) DO UPDATE SET
             score = EXCLUDED.score,
             poster = EXCLUDED.poster,
             actors = EXCLUDED.actors,
             region = EXCLUDED.region,
             category = EXCLUDED.category,
             summary = EXCLUDED.summary",
    )
    .bind(&movie.title)
    .bind(movie.score)
    .bind(movie.date)
    .bind(&movie.poster)
    .bind(&movie.actors)
    .bind(&movie.region)
    .bind(&movie.category)
    .bind(&movie.summary)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_param_known_values() {
        assert_eq!(Sort::from_param(Some("date")), Sort::DateDesc);
        assert_eq!(Sort::from_param(Some("-date")), Sort::DateDesc);
        assert_eq!(Sort::from_param(Some("score")), Sort::ScoreDesc);
        assert_eq!(Sort::from_param(Some("-score")), Sort::ScoreDesc);
    }

    #[test]
    fn test_sort_from_param_falls_back_to_date_desc() {
        assert_eq!(Sort::from_param(Some("rating")), Sort::DateDesc);
        assert_eq!(Sort::from_param(Some("")), Sort::DateDesc);
        assert_eq!(Sort::from_param(None), Sort::DateDesc);
    }

    #[test]
    fn test_sort_round_trips_as_param() {
        for sort in [Sort::DateDesc, Sort::ScoreDesc] {
            assert_eq!(Sort::from_param(Some(sort.as_param())), sort);
        }
    }

    #[test]
    fn test_like_escape_wildcards() {
        assert_eq!(like_escape("100%_pure\\"), "100\\%\\_pure\\\\");
    }

    #[test]
    fn test_contains_pattern_wraps_in_wildcards() {
        assert_eq!(contains_pattern("Drama"), "%Drama%");
    }
}
