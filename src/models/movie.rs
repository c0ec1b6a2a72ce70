use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog movie
///
/// Multi-valued attributes (actors, region, category) are stored as
/// delimiter-joined strings and tokenized on read with [`split_tokens`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub score: Option<f64>,
    pub date: Option<NaiveDate>,
    pub poster: Option<String>,
    pub actors: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
}

impl Movie {
    /// Category tokens, normalized
    pub fn category_tokens(&self) -> Vec<String> {
        split_tokens(self.category.as_deref())
    }

    /// Actor tokens, normalized
    pub fn actor_tokens(&self) -> Vec<String> {
        split_tokens(self.actors.as_deref())
    }
}

/// A movie as received from the bulk loader, prior to insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub score: Option<f64>,
    pub date: Option<NaiveDate>,
    pub poster: Option<String>,
    pub actors: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
}

/// Compact movie representation used by list and recommendation responses
#[derive(Debug, Clone, Serialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub score: Option<f64>,
    pub poster: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            score: movie.score,
            poster: movie.poster.clone(),
            category: movie.category.clone(),
            region: movie.region.clone(),
            date: movie.date,
        }
    }
}

/// Splits a delimiter-joined attribute string into trimmed, non-empty tokens.
///
/// Comma, fullwidth comma, fullwidth enumeration mark, pipe, and slash are
/// all treated as equivalent separators. `None` or empty input yields an
/// empty list.
pub fn split_tokens(value: Option<&str>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    value
        .split(['，', '、', '|', '/', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
