use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{JudgmentPhase, Post};

pub const FAILED_SCORE: u8 = 50;
pub const FAILED_VERDICT: &str = "AI broke, but you're probably cooked.";
pub const FALLBACK_VERDICT: &str = "AI is blind right now, but you look cooked.";
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeRequest {
    #[serde(default)]
    pub story: String,
    #[serde(rename = "imageBase64", default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub cooked_score: u8,
    pub verdict: String,
}

/// Raw judgment as the model returns it, before clamping.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJudgment {
    pub cooked_score: f64,
    #[serde(default)]
    pub verdict: String,
}

impl RawJudgment {
    pub fn normalize(self) -> Result<JudgmentResult, String> {
        if !self.cooked_score.is_finite() {
            return Err("cooked_score is not a number".to_string());
        }
        let verdict = self.verdict.trim().to_string();
        if verdict.is_empty() {
            return Err("verdict is empty".to_string());
        }
        Ok(JudgmentResult {
            cooked_score: self.cooked_score.round().clamp(0.0, 100.0) as u8,
            verdict,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Accepts a `data:<mime>;base64,<data>` URI or bare base64.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (mime_type, data) = match raw.split_once(',') {
            Some((header, data)) => (mime_from_header(header), data.trim()),
            None => (DEFAULT_IMAGE_MIME.to_string(), raw),
        };
        if data.is_empty() {
            return Err("image data is empty".to_string());
        }
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|err| format!("image is not valid base64: {}", err))?;
        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }
}

fn mime_from_header(header: &str) -> String {
    header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string()
}

/// What the judge endpoint answers when the model is unavailable.
pub fn fallback_judgment() -> JudgmentResult {
    let mut rng = rand::thread_rng();
    JudgmentResult {
        cooked_score: rng.gen_range(0..100),
        verdict: FALLBACK_VERDICT.to_string(),
    }
}

impl Post {
    /// Applies the judgment outcome to a pending post. Returns false when the
    /// post was already judged, in which case nothing changes.
    pub fn resolve_judgment(&mut self, outcome: Result<JudgmentResult, String>) -> bool {
        if !self.is_analyzing() {
            tracing::debug!(post_id = %self.id, "dropping late judgment");
            return false;
        }

        match outcome {
            Ok(result) => {
                let score = result.cooked_score.min(100);
                self.ai_score = score;
                self.display_score = score;
                self.verdict = result.verdict;
                self.judgment = JudgmentPhase::Resolved;
            }
            Err(err) => {
                tracing::warn!(post_id = %self.id, error = %err, "judgment failed, using fallback");
                self.ai_score = FAILED_SCORE;
                self.display_score = FAILED_SCORE;
                self.verdict = FAILED_VERDICT.to_string();
                self.judgment = JudgmentPhase::Failed;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostKind;

    fn pending() -> Post {
        Post::pending(
            PostKind::Shame,
            "dave".to_string(),
            None,
            "dropped my phone".to_string(),
            None,
        )
    }

    #[test]
    fn resolved_judgment_seeds_scores() {
        let mut post = pending();
        let applied = post.resolve_judgment(Ok(JudgmentResult {
            cooked_score: 88,
            verdict: "Caught in 4k.".to_string(),
        }));
        assert!(applied);
        assert_eq!(post.ai_score, 88);
        assert_eq!(post.display_score, 88);
        assert_eq!(post.verdict, "Caught in 4k.");
        assert!(!post.is_analyzing());
    }

    #[test]
    fn failed_judgment_uses_fixed_fallback() {
        let mut post = pending();
        post.resolve_judgment(Err("network unreachable".to_string()));
        assert_eq!(post.ai_score, 50);
        assert_eq!(post.display_score, 50);
        assert_eq!(post.verdict, "AI broke, but you're probably cooked.");
        assert_eq!(post.judgment, JudgmentPhase::Failed);
        assert!(!post.is_analyzing());
    }

    #[test]
    fn ai_score_is_set_once() {
        let mut post = pending();
        post.resolve_judgment(Ok(JudgmentResult {
            cooked_score: 20,
            verdict: "Skill issue.".to_string(),
        }));
        let applied = post.resolve_judgment(Ok(JudgmentResult {
            cooked_score: 99,
            verdict: "Joever.".to_string(),
        }));
        assert!(!applied);
        assert_eq!(post.ai_score, 20);
        assert_eq!(post.verdict, "Skill issue.");
    }

    #[test]
    fn raw_judgment_is_clamped() {
        let raw = RawJudgment {
            cooked_score: 140.2,
            verdict: "  burnt  ".to_string(),
        };
        let result = raw.normalize().unwrap();
        assert_eq!(result.cooked_score, 100);
        assert_eq!(result.verdict, "burnt");

        let negative = RawJudgment {
            cooked_score: -3.0,
            verdict: "fine".to_string(),
        };
        assert_eq!(negative.normalize().unwrap().cooked_score, 0);
    }

    #[test]
    fn raw_judgment_needs_a_verdict() {
        let raw = RawJudgment {
            cooked_score: 40.0,
            verdict: "   ".to_string(),
        };
        assert!(raw.normalize().is_err());
    }

    #[test]
    fn fallback_stays_in_range() {
        for _ in 0..50 {
            let result = fallback_judgment();
            assert!(result.cooked_score < 100);
            assert_eq!(result.verdict, FALLBACK_VERDICT);
        }
    }

    #[test]
    fn image_data_uri_keeps_mime() {
        let payload = ImagePayload::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "aGVsbG8=");
    }

    #[test]
    fn bare_base64_defaults_to_jpeg() {
        let payload = ImagePayload::parse("aGVsbG8=").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[test]
    fn image_must_decode() {
        assert!(ImagePayload::parse("data:image/png;base64,***").is_err());
        assert!(ImagePayload::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn request_uses_camel_case_image_field() {
        let request: JudgeRequest =
            serde_json::from_str(r#"{"story":"oops","imageBase64":"aGVsbG8="}"#).unwrap();
        assert_eq!(request.image_base64.as_deref(), Some("aGVsbG8="));
    }
}
