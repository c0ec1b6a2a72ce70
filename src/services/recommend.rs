//! AI recommendation pipeline: summarize preferences, consult the remote
//! model, extract and normalize its JSON reply, and cross-reference the
//! suggested titles against the local catalog.

use serde_json::Value;
use sqlx::PgPool;

use crate::{
    db::{self, Cache, CacheKey},
    error::AppResult,
    models::{AiItem, AiRecommendResponse, AiRecommendation, Movie},
    services::{extract::extract_json, prompt, providers::TextGenProvider},
};

const AI_RESULT_TTL: u64 = 3600;

/// What came back from one model consultation, before catalog enrichment
#[derive(Debug, PartialEq)]
pub enum ModelVerdict {
    /// A JSON payload was extracted; items may still be empty
    Parsed {
        analysis: Option<String>,
        items: Vec<AiItem>,
        raw: String,
    },
    /// The call failed, or the reply contained no JSON anywhere
    Failed { message: String, raw: Option<String> },
}

/// Parses the extracted JSON payload into analysis text and items.
///
/// Entries that fail to deserialize or carry a blank title are dropped
/// rather than failing the batch.
fn parse_payload(payload: &Value) -> (Option<String>, Vec<AiItem>) {
    let analysis = payload["analysis"]
        .as_str()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let items = payload["recommendations"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<AiItem>(entry.clone()).ok())
                .filter(|item| !item.title.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    (analysis, items)
}

/// Sends the prompt and normalizes the reply into a [`ModelVerdict`].
///
/// Remote failures and unparseable replies both fold into
/// [`ModelVerdict::Failed`]; the raw text is preserved whenever it exists.
pub async fn consult_model(provider: &dyn TextGenProvider, prompt: &str) -> ModelVerdict {
    let reply = match provider.generate(prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Remote recommendation call failed");
            return ModelVerdict::Failed {
                message: format!("remote call failed: {}", e),
                raw: None,
            };
        }
    };

    let Some(payload) = extract_json(&reply) else {
        tracing::warn!(provider = provider.name(), "Model reply contained no JSON");
        return ModelVerdict::Failed {
            message: "model reply contained no JSON".to_string(),
            raw: Some(reply),
        };
    };

    let (analysis, items) = parse_payload(&payload);
    ModelVerdict::Parsed {
        analysis,
        items,
        raw: reply,
    }
}

/// Merges one model item with its catalog match, if any.
///
/// Model-supplied fields win; the catalog fills gaps and contributes the
/// poster. Unmatched items keep an empty poster.
fn merge_item(item: AiItem, catalog: Option<&Movie>) -> AiRecommendation {
    AiRecommendation {
        title: item.title,
        kind: item.kind.or_else(|| catalog.and_then(|m| m.category.clone())),
        region: item.region.or_else(|| catalog.and_then(|m| m.region.clone())),
        score: item.score.or_else(|| catalog.and_then(|m| m.score)),
        reason: item.reason,
        poster: catalog
            .and_then(|m| m.poster.clone())
            .unwrap_or_default(),
        movie_id: catalog.map(|m| m.id),
    }
}

/// Looks a suggested title up in the catalog: exact match first, substring
/// fallback second.
async fn lookup_title(pool: &PgPool, title: &str) -> AppResult<Option<Movie>> {
    if let Some(movie) = db::movies::by_exact_title(pool, title).await? {
        return Ok(Some(movie));
    }
    db::movies::by_title_substring(pool, title).await
}

async fn enrich_items(pool: &PgPool, items: Vec<AiItem>) -> AppResult<Vec<AiRecommendation>> {
    let mut recommendations = Vec::with_capacity(items.len());
    for item in items {
        let catalog = lookup_title(pool, item.title.trim()).await?;
        recommendations.push(merge_item(item, catalog.as_ref()));
    }
    Ok(recommendations)
}

/// Runs the full AI recommendation pipeline for one user.
///
/// Short-circuits before any remote call when the user has neither
/// favorites nor ratings. Successful outcomes are cached per user.
pub async fn ai_recommendations(
    pool: &PgPool,
    cache: &Cache,
    provider: &dyn TextGenProvider,
    user_id: i64,
) -> AppResult<AiRecommendResponse> {
    let cache_key = CacheKey::AiRecommend(user_id);
    if let Some(cached) = cache.get_from_cache::<AiRecommendResponse>(&cache_key).await? {
        tracing::debug!(user_id, "AI recommendation cache hit");
        return Ok(cached);
    }

    let favorites = db::actions::favorites(pool, user_id, prompt::PREFERENCE_LIMIT).await?;
    let top_rated = db::actions::top_rated(pool, user_id, prompt::PREFERENCE_LIMIT).await?;

    if favorites.is_empty() && top_rated.is_empty() {
        return Ok(AiRecommendResponse::insufficient());
    }

    let prompt_text = prompt::build_prompt(&favorites, &top_rated);
    let response = match consult_model(provider, &prompt_text).await {
        ModelVerdict::Failed { message, raw } => AiRecommendResponse::failed(message, raw),
        ModelVerdict::Parsed { analysis, items, raw } => {
            if items.is_empty() {
                AiRecommendResponse::empty(analysis, raw)
            } else {
                let recommendations = enrich_items(pool, items).await?;
                AiRecommendResponse::with_items(analysis, recommendations)
            }
        }
    };

    // Only settled successes are worth replaying; failures and empty
    // results should retry on the next request.
    if response.success && !response.recommendations.is_empty() {
        cache.store(&cache_key, &response, AI_RESULT_TTL).await;
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::providers::MockTextGenProvider;
    use chrono::NaiveDate;
    use serde_json::json;

    fn catalog_movie(title: &str) -> Movie {
        Movie {
            id: 11,
            title: title.to_string(),
            score: Some(9.2),
            date: NaiveDate::from_ymd_opt(2008, 7, 18),
            poster: Some("https://img.example/dark-knight.jpg".to_string()),
            actors: Some("Christian Bale/Heath Ledger".to_string()),
            region: Some("USA".to_string()),
            category: Some("Action/Crime".to_string()),
            summary: None,
        }
    }

    #[test]
    fn test_parse_payload_full() {
        let payload = json!({
            "analysis": "You like crime dramas.",
            "recommendations": [
                {"title": "Heat", "type": "Crime", "region": "USA", "score": 8.3, "reason": "classic"},
                {"title": "  ", "type": "Crime"},
                {"title": "Se7en"}
            ]
        });

        let (analysis, items) = parse_payload(&payload);
        assert_eq!(analysis.as_deref(), Some("You like crime dramas."));
        // The blank-titled entry is dropped.
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Heat");
        assert_eq!(items[1].title, "Se7en");
    }

    #[test]
    fn test_parse_payload_missing_sections() {
        let (analysis, items) = parse_payload(&json!({"unexpected": true}));
        assert_eq!(analysis, None);
        assert!(items.is_empty());
    }

    #[test]
    fn test_merge_item_prefers_model_fields() {
        let item = AiItem {
            title: "The Dark Knight".to_string(),
            kind: Some("Superhero".to_string()),
            region: Some("US/UK".to_string()),
            score: Some(9.0),
            reason: Some("matches your taste".to_string()),
        };

        let movie = catalog_movie("The Dark Knight");
        let merged = merge_item(item, Some(&movie));

        assert_eq!(merged.kind.as_deref(), Some("Superhero"));
        assert_eq!(merged.region.as_deref(), Some("US/UK"));
        assert_eq!(merged.score, Some(9.0));
        // Poster always comes from the catalog.
        assert_eq!(merged.poster, "https://img.example/dark-knight.jpg");
        assert_eq!(merged.movie_id, Some(11));
    }

    #[test]
    fn test_merge_item_falls_back_to_catalog() {
        let item = AiItem {
            title: "The Dark Knight".to_string(),
            ..AiItem::default()
        };

        let movie = catalog_movie("The Dark Knight");
        let merged = merge_item(item, Some(&movie));

        assert_eq!(merged.kind.as_deref(), Some("Action/Crime"));
        assert_eq!(merged.region.as_deref(), Some("USA"));
        assert_eq!(merged.score, Some(9.2));
        assert_eq!(merged.reason, None);
    }

    #[test]
    fn test_merge_item_without_catalog_match() {
        let item = AiItem {
            title: "Totally Unknown".to_string(),
            kind: Some("Drama".to_string()),
            ..AiItem::default()
        };

        let merged = merge_item(item, None);
        assert_eq!(merged.title, "Totally Unknown");
        assert_eq!(merged.poster, "");
        assert_eq!(merged.movie_id, None);
        assert_eq!(merged.kind.as_deref(), Some("Drama"));
    }

    #[tokio::test]
    async fn test_consult_model_parses_fenced_reply() {
        let mut provider = MockTextGenProvider::new();
        provider.expect_generate().returning(|_| {
            Ok("Here you go: ```json\n{\"analysis\": \"taste\", \"recommendations\": [{\"title\": \"Heat\"}]}\n```".to_string())
        });
        provider.expect_name().return_const("mock");

        match consult_model(&provider, "prompt").await {
            ModelVerdict::Parsed { analysis, items, .. } => {
                assert_eq!(analysis.as_deref(), Some("taste"));
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].title, "Heat");
            }
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_consult_model_no_json_keeps_raw() {
        let mut provider = MockTextGenProvider::new();
        provider
            .expect_generate()
            .returning(|_| Ok("I cannot produce JSON today.".to_string()));
        provider.expect_name().return_const("mock");

        match consult_model(&provider, "prompt").await {
            ModelVerdict::Failed { message, raw } => {
                assert!(message.contains("no JSON"));
                assert_eq!(raw.as_deref(), Some("I cannot produce JSON today."));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_consult_model_remote_failure() {
        let mut provider = MockTextGenProvider::new();
        provider
            .expect_generate()
            .returning(|_| Err(AppError::ExternalApi("status 401: bad key".to_string())));
        provider.expect_name().return_const("mock");

        match consult_model(&provider, "prompt").await {
            ModelVerdict::Failed { message, raw } => {
                assert!(message.contains("remote call failed"));
                assert!(message.contains("bad key"));
                assert_eq!(raw, None);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
