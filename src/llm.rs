use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};

use crate::config::JudgeConfig;
use crate::judgment::{fallback_judgment, ImagePayload, JudgeRequest, JudgmentResult, RawJudgment};

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl LlmClient {
    pub fn from_env(config: &JudgeConfig) -> Option<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        Some(Self::new(api_key, config))
    }

    pub fn new(api_key: String, config: &JudgeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn judge(&self, request: &JudgeRequest) -> Result<JudgmentResult, String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let body = build_request(request)?;
        let started = Instant::now();

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| format!("Gemini request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(format!("Gemini API error: {}", status));
            }
            return Err(format!("Gemini API error: {} {}", status, detail));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| format!("Gemini response parse failed: {}", err))?;

        tracing::debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "Gemini judgment received"
        );

        parse_judgment(&body)
    }
}

/// The judge endpoint contract: always answers, degrading to a random
/// fallback when the model is missing or misbehaves.
#[derive(Clone, Default)]
pub struct JudgeService {
    client: Option<LlmClient>,
}

impl JudgeService {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub async fn judge(&self, request: &JudgeRequest) -> JudgmentResult {
        let Some(client) = self.client.as_ref() else {
            tracing::warn!("Gemini API key not configured, using fallback judgment");
            return fallback_judgment();
        };
        match client.judge(request).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "Gemini judgment failed, using fallback");
                fallback_judgment()
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn build_request(request: &JudgeRequest) -> Result<GenerateRequest, String> {
    let mut parts = vec![Part {
        text: Some(request.story.clone()),
        inline_data: None,
    }];

    if let Some(raw) = request.image_base64.as_deref() {
        let image = ImagePayload::parse(raw)?;
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type,
                data: image.data,
            }),
        });
    }

    Ok(GenerateRequest {
        system_instruction: Content {
            parts: vec![Part {
                text: Some(system_prompt()),
                inline_data: None,
            }],
        },
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    })
}

fn parse_judgment(body: &GenerateResponse) -> Result<JudgmentResult, String> {
    let text = body
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| "No response from AI".to_string())?;

    let json = extract_json(&text).ok_or_else(|| "Gemini response missing JSON".to_string())?;
    let raw: RawJudgment = serde_json::from_str(&json)
        .map_err(|err| format!("Gemini JSON parse failed: {}", err))?;
    raw.normalize()
}

fn system_prompt() -> String {
    let prompt = r#"You are the "Judge of Being Cooked". Your job is to analyze stories and optional images of bad luck, failure, and embarrassment.
You act like a sarcastic, ruthless Gen Z internet commenter.

For each submission:
1. Assign a "cooked_score" from 0 to 100 based on how bad the situation is.
   - 0-20: Barely cooked. Minor inconvenience.
   - 21-50: Medium rare. It hurts, but you'll live.
   - 51-80: Well done. This is bad.
   - 81-100: Congratulations, you are burnt to a crisp. Absolute disaster.
2. Provide a "verdict". This should be a savage, funny, short roast (max 25 words).
   - Do not use generic responses. Reference specific details from the story or image.
   - Use Gen Z slang naturally (e.g., "skill issue", "caught in 4k", "it's joever", "emotional damage", "cooked").
   - If an image is provided, roast its visual details specifically.

Return the result in JSON format.
"#;
    prompt.to_string()
}

fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "cooked_score": {
                "type": "INTEGER",
                "description": "The level of disaster from 0 to 100"
            },
            "verdict": {
                "type": "STRING",
                "description": "A short sarcastic roast or comment"
            }
        },
        "required": ["cooked_score", "verdict"]
    })
}

fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(text[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str) -> GenerateResponse {
        serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
        .unwrap()
    }

    #[test]
    fn parses_plain_json_candidate() {
        let body = response(r#"{"cooked_score": 91, "verdict": "Flushed twice. Joever."}"#);
        let result = parse_judgment(&body).unwrap();
        assert_eq!(result.cooked_score, 91);
        assert_eq!(result.verdict, "Flushed twice. Joever.");
    }

    #[test]
    fn tolerates_fenced_json() {
        let body = response("```json\n{\"cooked_score\": 12, \"verdict\": \"Minor L.\"}\n```");
        assert_eq!(parse_judgment(&body).unwrap().cooked_score, 12);
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(parse_judgment(&body).unwrap_err(), "No response from AI");
    }

    #[test]
    fn non_json_text_is_an_error() {
        let body = response("I refuse to judge this.");
        assert!(parse_judgment(&body).is_err());
    }

    #[test]
    fn request_carries_story_and_image() {
        let request = JudgeRequest {
            story: "Deleted the user table".to_string(),
            image_base64: Some("data:image/png;base64,aGVsbG8=".to_string()),
        };
        let body = serde_json::to_value(build_request(&request).unwrap()).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Deleted the user table");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Judge of Being Cooked"));
    }

    #[test]
    fn request_rejects_bad_image() {
        let request = JudgeRequest {
            story: "oops".to_string(),
            image_base64: Some("not base64!".to_string()),
        };
        assert!(build_request(&request).is_err());
    }

    #[tokio::test]
    async fn unconfigured_service_falls_back() {
        let service = JudgeService::new(None);
        assert!(!service.is_configured());
        let result = service
            .judge(&JudgeRequest {
                story: "oops".to_string(),
                image_base64: None,
            })
            .await;
        assert!(result.cooked_score < 100);
        assert_eq!(result.verdict, crate::judgment::FALLBACK_VERDICT);
    }
}
