use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Aggregate keys in the moderation payload; everything else numeric is a
/// per-category toxicity score.
const RESERVED_KEYS: &[&str] = &[
    "safer_value",
    "sum_value",
    "max_value",
    "is_flagged",
    "is_safer_flagged",
];

/// Normalized result of one toxicity-classification call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    pub overall_score: f64,
    pub max_score: f64,
    pub max_category: String,
    pub category_scores: HashMap<String, f64>,
    pub is_flagged: bool,
}

/// Errors from the moderation API call. Internal only; `classify` degrades to
/// a default result instead of surfacing these.
#[derive(Debug)]
pub enum ClassifyError {
    Http(reqwest::Error),
    Malformed(String),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

#[derive(Deserialize)]
struct GradioResponse {
    data: Value,
}

/// Score a message for toxicity. A classification outage must never crash or
/// block message processing, so every failure is logged and mapped to an
/// unflagged all-zero result.
pub async fn classify(
    client: &reqwest::Client,
    api_url: &str,
    text: &str,
    threshold: f64,
) -> ClassificationResult {
    match fetch_toxicity(client, api_url, text, threshold).await {
        Ok(result) => {
            tracing::debug!(
                flagged = result.is_flagged,
                score = result.overall_score,
                "toxicity analysis complete"
            );
            result
        }
        Err(e) => {
            tracing::error!("toxicity analysis failed: {e}");
            ClassificationResult::default()
        }
    }
}

async fn fetch_toxicity(
    client: &reqwest::Client,
    api_url: &str,
    text: &str,
    threshold: f64,
) -> Result<ClassificationResult, ClassifyError> {
    let url = format!(
        "{}/run/fetch_toxicity_level",
        api_url.trim_end_matches('/')
    );
    let body = serde_json::json!({ "data": [text, threshold] });

    let response = client.post(&url).json(&body).send().await?;
    let envelope: GradioResponse = response.json().await?;

    let payload = unwrap_payload(envelope.data)?;
    Ok(normalize(&payload))
}

/// The endpoint answers either with the scores object directly or with a
/// multi-output container whose second element is the scores, possibly encoded
/// as a JSON string. Reduce all of those to one object.
fn unwrap_payload(data: Value) -> Result<Value, ClassifyError> {
    let mut payload = match data {
        Value::Array(mut outputs) if outputs.len() > 1 => outputs.swap_remove(1),
        Value::Array(mut outputs) if outputs.len() == 1 => outputs.remove(0),
        other => other,
    };

    if let Value::String(text) = payload {
        payload = serde_json::from_str(&text)
            .map_err(|e| ClassifyError::Malformed(format!("inner JSON: {e}")))?;
    }

    if payload.is_object() {
        Ok(payload)
    } else {
        Err(ClassifyError::Malformed(format!(
            "expected an object, got {payload}"
        )))
    }
}

fn normalize(payload: &Value) -> ClassificationResult {
    let mut category_scores = HashMap::new();
    if let Some(obj) = payload.as_object() {
        for (key, value) in obj {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(score) = value.as_f64() {
                category_scores.insert(key.clone(), score);
            }
        }
    }

    ClassificationResult {
        overall_score: payload.get("sum_value").and_then(Value::as_f64).unwrap_or(0.0),
        max_score: payload.get("max_value").and_then(Value::as_f64).unwrap_or(0.0),
        max_category: payload
            .get("max_key")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        category_scores,
        is_flagged: payload
            .get("is_flagged")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores_json() -> Value {
        serde_json::json!({
            "sum_value": 0.9,
            "max_value": 0.85,
            "max_key": "threat",
            "is_flagged": true,
            "safer_value": 0.1,
            "is_safer_flagged": false,
            "threat": 0.85,
            "insult": 0.3
        })
    }

    #[test]
    fn test_normalize_direct_payload() {
        let result = normalize(&scores_json());

        assert!(result.is_flagged);
        assert_eq!(result.overall_score, 0.9);
        assert_eq!(result.max_score, 0.85);
        assert_eq!(result.max_category, "threat");
        assert_eq!(result.category_scores.len(), 2);
        assert_eq!(result.category_scores["threat"], 0.85);
        assert_eq!(result.category_scores["insult"], 0.3);
    }

    #[test]
    fn test_reserved_keys_excluded_from_categories() {
        let result = normalize(&scores_json());
        for key in RESERVED_KEYS {
            assert!(!result.category_scores.contains_key(*key));
        }
        // max_key is a string, so the numeric filter drops it too
        assert!(!result.category_scores.contains_key("max_key"));
    }

    #[test]
    fn test_integer_scores_coerced_to_float() {
        let payload = serde_json::json!({ "sum_value": 1, "obscene": 1 });
        let result = normalize(&payload);
        assert_eq!(result.overall_score, 1.0);
        assert_eq!(result.category_scores["obscene"], 1.0);
    }

    #[test]
    fn test_unwrap_tuple_with_encoded_second_element() {
        let data = serde_json::json!(["plot.png", scores_json().to_string()]);
        let payload = unwrap_payload(data).unwrap();
        let result = normalize(&payload);
        assert!(result.is_flagged);
        assert_eq!(result.max_category, "threat");
    }

    #[test]
    fn test_unwrap_single_output() {
        let data = serde_json::json!([scores_json()]);
        let payload = unwrap_payload(data).unwrap();
        assert_eq!(normalize(&payload).max_category, "threat");
    }

    #[test]
    fn test_unwrap_rejects_non_object_payload() {
        assert!(unwrap_payload(serde_json::json!(42)).is_err());
        assert!(unwrap_payload(serde_json::json!(["a", "not json at all"])).is_err());
    }

    #[test]
    fn test_default_result_is_unflagged_and_zeroed() {
        let result = ClassificationResult::default();
        assert!(!result.is_flagged);
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.max_score, 0.0);
        assert!(result.max_category.is_empty());
        assert!(result.category_scores.is_empty());
    }

    #[tokio::test]
    async fn test_classify_degrades_on_unreachable_endpoint() {
        // Port 9 is discard; the connection fails immediately and classify
        // must fall back to the default result instead of erroring.
        let client = reqwest::Client::new();
        let result = classify(&client, "http://127.0.0.1:9", "you are worthless", 0.5).await;
        assert!(!result.is_flagged);
        assert!(result.category_scores.is_empty());
    }
}
