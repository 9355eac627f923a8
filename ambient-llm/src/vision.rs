//! Vision client (C2, §4.2): turns a JPEG frame into a structured
//! `AnalysisResult`.

use ambient_core::error::LlmError;
use ambient_core::{AnalysisResult, LlmConfig};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use crate::client::OpenAiCompatibleClient;

const SYSTEM_PROMPT: &str = "You are a screen-activity analyst. Respond with exactly one JSON \
object and nothing else, with the keys: summary, context, activities, key_elements, \
user_intent. summary and context and user_intent are strings; activities and key_elements are \
arrays of strings.";

pub struct VisionClient {
    client: OpenAiCompatibleClient,
}

impl VisionClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: OpenAiCompatibleClient::for_vision(config),
        }
    }

    /// §4.2 "Protocol": a system message enforcing the JSON contract, and a
    /// user message carrying the optional previous context plus the image
    /// as a low-detail data URL.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        previous_context: &str,
    ) -> Result<AnalysisResult, LlmError> {
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(image_bytes)
        );

        let mut content = Vec::new();
        if !previous_context.is_empty() {
            content.push(json!({
                "type": "text",
                "text": format!("Previous context: {previous_context}")
            }));
        }
        content.push(json!({
            "type": "image_url",
            "image_url": {"url": data_url, "detail": "low"}
        }));

        let messages = vec![
            json!({"role": "system", "content": SYSTEM_PROMPT}),
            json!({"role": "user", "content": content}),
        ];

        let raw = self.client.chat_completion(messages).await?;
        Ok(parse_analysis(&raw))
    }

    /// §4.6 "Startup": liveness probe against the configured vision endpoint.
    pub async fn health(&self) -> Result<(), LlmError> {
        self.client.health().await
    }
}

/// §4.2 "Parsing": strict JSON parse, then per-field type checking; any
/// parse failure degrades to the raw-text fallback.
fn parse_analysis(raw: &str) -> AnalysisResult {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return AnalysisResult::from_raw_text(raw),
    };

    let Some(obj) = value.as_object() else {
        return AnalysisResult::from_raw_text(raw);
    };

    let mut result = AnalysisResult {
        summary: String::new(),
        context: AnalysisResult::UNKNOWN_CONTEXT.to_string(),
        activities: Vec::new(),
        key_elements: Vec::new(),
        user_intent: AnalysisResult::UNKNOWN_CONTEXT.to_string(),
    };

    if let Some(s) = obj.get("summary").and_then(Value::as_str) {
        result.summary = s.to_string();
    }
    if let Some(s) = obj.get("context").and_then(Value::as_str) {
        result.context = s.to_string();
    }
    if let Some(s) = obj.get("user_intent").and_then(Value::as_str) {
        result.user_intent = s.to_string();
    }
    if let Some(list) = obj.get("activities").and_then(string_list) {
        result.activities = list;
    }
    if let Some(list) = obj.get("key_elements").and_then(string_list) {
        result.key_elements = list;
    }

    result
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let arr = value.as_array()?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(item.as_str()?.to_string());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_json_is_parsed_field_by_field() {
        let raw = r#"{"summary":"watching a video","context":"browser","activities":["watching"],"key_elements":["youtube"],"user_intent":"learning"}"#;
        let result = parse_analysis(raw);
        assert_eq!(result.summary, "watching a video");
        assert_eq!(result.context, "browser");
        assert_eq!(result.activities, vec!["watching".to_string()]);
        assert_eq!(result.user_intent, "learning");
    }

    #[test]
    fn malformed_shape_fields_are_silently_skipped() {
        let raw = r#"{"summary":"ok","activities":"not-a-list","key_elements":[1,2,3]}"#;
        let result = parse_analysis(raw);
        assert_eq!(result.summary, "ok");
        assert!(result.activities.is_empty());
        assert!(result.key_elements.is_empty());
        assert_eq!(result.context, AnalysisResult::UNKNOWN_CONTEXT);
    }

    #[test]
    fn invalid_json_falls_back_to_raw_text() {
        let raw = "the model just rambled instead of returning json";
        let result = parse_analysis(raw);
        assert_eq!(result.summary, raw);
        assert_eq!(result.context, AnalysisResult::UNKNOWN_CONTEXT);
    }

    #[test]
    fn overlong_raw_text_fallback_is_truncated() {
        let raw = "x".repeat(600);
        let result = parse_analysis(&raw);
        assert_eq!(result.summary.chars().count(), 503);
        assert!(result.summary.ends_with("..."));
    }
}
