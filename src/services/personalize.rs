//! Frequency-heuristic personalization over a user's interaction history.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    cached,
    db::{self, actions::InteractedMovie, Cache, CacheKey},
    error::AppResult,
    models::{split_tokens, Movie},
};

/// How far back into the user's history the scorer looks
const HISTORY_WINDOW: i64 = 200;

/// How many of the most frequent category/actor tokens become filter signals
const TOP_SIGNALS: usize = 5;

/// Default result size for recommendation listings
pub const DEFAULT_LIMIT: i64 = 24;

const HOT_LIST_TTL: u64 = 300;

/// Frequency counter preserving first-encounter order.
///
/// Ties among equally frequent tokens resolve to whichever token was seen
/// first, which keeps the ranking deterministic for a given history.
#[derive(Debug, Default)]
struct TokenCounter {
    counts: HashMap<String, (usize, usize)>,
    next_index: usize,
}

impl TokenCounter {
    fn extend(&mut self, tokens: Vec<String>) {
        for token in tokens {
            let entry = self.counts.entry(token).or_insert((0, self.next_index));
            if entry.0 == 0 {
                self.next_index += 1;
            }
            entry.0 += 1;
        }
    }

    fn top(&self, n: usize) -> Vec<String> {
        let mut entries: Vec<(&String, usize, usize)> = self
            .counts
            .iter()
            .map(|(token, &(count, first_seen))| (token, count, first_seen))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries.into_iter().take(n).map(|(t, _, _)| t.clone()).collect()
    }
}

/// The signal tokens and exclusion set distilled from a history window
#[derive(Debug, PartialEq)]
struct PreferenceSignals {
    categories: Vec<String>,
    actors: Vec<String>,
    seen_movie_ids: Vec<i64>,
}

fn collect_signals(history: &[InteractedMovie]) -> PreferenceSignals {
    let mut category_counter = TokenCounter::default();
    let mut actor_counter = TokenCounter::default();
    let mut seen_movie_ids = Vec::with_capacity(history.len());

    for interaction in history {
        seen_movie_ids.push(interaction.movie_id);
        category_counter.extend(split_tokens(interaction.category.as_deref()));
        actor_counter.extend(split_tokens(interaction.actors.as_deref()));
    }

    PreferenceSignals {
        categories: category_counter.top(TOP_SIGNALS),
        actors: actor_counter.top(TOP_SIGNALS),
        seen_movie_ids,
    }
}

/// Builds personalized recommendations from the user's recent history.
///
/// Returns `None` when personalization is not possible: the user has no
/// interactions, the history carries no category/actor signal, or nothing in
/// the catalog matches the signals. Callers fall back to [`hot_list`] in
/// that case; `None` is distinct from an empty successful result by design.
pub async fn personalized_recommendations(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> AppResult<Option<Vec<Movie>>> {
    let history = db::actions::recent_interactions(pool, user_id, HISTORY_WINDOW).await?;
    if history.is_empty() {
        return Ok(None);
    }

    let signals = collect_signals(&history);
    if signals.categories.is_empty() && signals.actors.is_empty() {
        tracing::debug!(user_id, "Interaction history carries no preference signal");
        return Ok(None);
    }

    let movies = db::movies::personalized(
        pool,
        &signals.categories,
        &signals.actors,
        &signals.seen_movie_ids,
        limit,
    )
    .await?;

    if movies.is_empty() {
        return Ok(None);
    }

    tracing::info!(
        user_id,
        history = history.len(),
        categories = ?signals.categories,
        actors = signals.actors.len(),
        results = movies.len(),
        "Personalized recommendations built"
    );

    Ok(Some(movies))
}

/// Catalog hot list: score descending, then date descending.
///
/// Used whenever personalization is unavailable; briefly cached since it is
/// identical for every caller.
pub async fn hot_list(pool: &PgPool, cache: &Cache, limit: i64) -> AppResult<Vec<Movie>> {
    cached!(cache, CacheKey::HotList(limit), HOT_LIST_TTL, async {
        db::movies::hot(pool, limit).await
    })
}
