use serde::{Deserialize, Serialize};

/// One recommended item as emitted by the text-generation model.
///
/// All fields besides the title are best-effort; the model is instructed to
/// fill them but not trusted to.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AiItem {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A recommendation after cross-referencing against the local catalog.
///
/// Model-supplied values win; catalog values only fill the gaps. The poster
/// is always catalog-sourced and empty when no catalog row matched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiRecommendation {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub movie_id: Option<i64>,
}

/// Terminal response of the AI recommendation pipeline.
///
/// Three terminal states plus the pre-call short circuit:
/// success-with-recommendations, success-but-empty, failure, and
/// insufficient preference data. The raw model text is preserved whenever it
/// exists so operators can diagnose empty or failed runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiRecommendResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<AiRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_reply: Option<String>,
}

impl AiRecommendResponse {
    pub fn insufficient() -> Self {
        Self {
            success: false,
            message: Some("insufficient preference data: favorite or rate some movies first".to_string()),
            analysis: None,
            recommendations: Vec::new(),
            raw_reply: None,
        }
    }

    pub fn failed(message: impl Into<String>, raw_reply: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            analysis: None,
            recommendations: Vec::new(),
            raw_reply,
        }
    }

    pub fn empty(analysis: Option<String>, raw_reply: String) -> Self {
        Self {
            success: true,
            message: Some("no recommendations".to_string()),
            analysis,
            recommendations: Vec::new(),
            raw_reply: Some(raw_reply),
        }
    }

    pub fn with_items(analysis: Option<String>, recommendations: Vec<AiRecommendation>) -> Self {
        Self {
            success: true,
            message: None,
            analysis,
            recommendations,
            raw_reply: None,
        }
    }
}

/// Accepts a score as either a JSON number or a numeric string; models emit
/// both.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_item_from_full_json() {
        let item: AiItem = serde_json::from_str(
            r#"{"title":"Inception","type":"Sci-Fi","region":"USA","score":8.8,"reason":"mind-bending"}"#,
        )
        .unwrap();
        assert_eq!(item.title, "Inception");
        assert_eq!(item.kind.as_deref(), Some("Sci-Fi"));
        assert_eq!(item.score, Some(8.8));
    }

    #[test]
    fn test_ai_item_score_as_string() {
        let item: AiItem = serde_json::from_str(r#"{"title":"Up","score":"8.3"}"#).unwrap();
        assert_eq!(item.score, Some(8.3));
    }

    #[test]
    fn test_ai_item_tolerates_missing_fields() {
        let item: AiItem = serde_json::from_str(r#"{"title":"Up"}"#).unwrap();
        assert_eq!(item.title, "Up");
        assert_eq!(item.kind, None);
        assert_eq!(item.score, None);
    }

    #[test]
    fn test_ai_item_tolerates_junk_score() {
        let item: AiItem = serde_json::from_str(r#"{"title":"Up","score":"high"}"#).unwrap();
        assert_eq!(item.score, None);
    }
}
