use serde::{Deserialize, Serialize};
use cooked::feed::ProfileStats;
use cooked::scoring::{classify_band, ScoreBand, VoteOutcome};
use cooked::{
    format_time_ago, Comment, CommunityVotes, JudgmentPhase, Post, PostKind, ReactionCounts,
};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub kind: Option<String>,
}

impl FeedQuery {
    pub fn kind(&self) -> Result<Option<PostKind>, String> {
        parse_kind(self.kind.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BandQuery {
    pub score: i64,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub kind: Option<String>,
    pub story: Option<String>,
    #[serde(rename = "imageBase64")]
    pub image_base64: Option<String>,
}

impl CreatePostRequest {
    pub fn into_parts(self) -> Result<(PostKind, String, Option<String>), String> {
        let kind = parse_kind(self.kind.as_deref())?.unwrap_or(PostKind::Shame);
        let story = self.story.unwrap_or_default();
        if story.trim().is_empty() {
            return Err("story is required".to_string());
        }
        Ok((kind, story, self.image_base64))
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i64,
}

impl VoteRequest {
    pub fn value(&self) -> Result<u8, String> {
        if !(0..=100).contains(&self.value) {
            return Err(format!("vote must be between 0 and 100: {}", self.value));
        }
        Ok(self.value as u8)
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub kind: PostKind,
    pub author: String,
    pub story: String,
    pub image: Option<String>,
    pub timestamp: i64,
    pub time_ago: String,
    pub ai_score: u8,
    pub score: u8,
    pub community_votes: CommunityVotes,
    pub verdict: String,
    pub judgment: JudgmentPhase,
    pub is_analyzing: bool,
    pub has_voted: bool,
    pub has_marked_w: bool,
    pub has_marked_l: bool,
    pub reactions: ReactionCounts,
    pub comments: Vec<Comment>,
    pub band: ScoreBand,
}

impl PostView {
    pub fn from_post(post: Post, now: i64) -> Self {
        let band = classify_band(post.display_score, post.kind);
        Self {
            time_ago: format_time_ago(post.timestamp, now),
            is_analyzing: post.is_analyzing(),
            id: post.id,
            kind: post.kind,
            author: post.author,
            story: post.story,
            image: post.image,
            timestamp: post.timestamp,
            ai_score: post.ai_score,
            score: post.display_score,
            community_votes: post.community_votes,
            verdict: post.verdict,
            judgment: post.judgment,
            has_voted: post.has_voted,
            has_marked_w: post.has_marked_w,
            has_marked_l: post.has_marked_l,
            reactions: post.reactions,
            comments: post.comments,
            band,
        }
    }

    pub fn from_posts(posts: Vec<Post>, now: i64) -> Vec<Self> {
        posts
            .into_iter()
            .map(|post| Self::from_post(post, now))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub accepted: bool,
    pub outcome: &'static str,
    pub post: PostView,
}

impl VoteResponse {
    pub fn new(outcome: VoteOutcome, post: PostView) -> Self {
        let (accepted, label) = match outcome {
            VoteOutcome::Accepted { .. } => (true, "accepted"),
            VoteOutcome::AlreadyVoted => (false, "already_voted"),
            VoteOutcome::StillAnalyzing => (false, "still_analyzing"),
        };
        Self {
            accepted,
            outcome: label,
            post,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub posts: Vec<PostView>,
    pub stats: ProfileStats,
}

#[derive(Debug, Serialize)]
pub struct BandResponse {
    pub score: u8,
    pub kind: PostKind,
    pub band: ScoreBand,
}

pub fn parse_kind(value: Option<&str>) -> Result<Option<PostKind>, String> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => PostKind::from_str(value)
            .map(Some)
            .ok_or_else(|| format!("invalid post kind: {}", value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_to_shame() {
        let request: CreatePostRequest =
            serde_json::from_str(r#"{"story":"fell off the stage"}"#).unwrap();
        let (kind, story, image) = request.into_parts().unwrap();
        assert_eq!(kind, PostKind::Shame);
        assert_eq!(story, "fell off the stage");
        assert!(image.is_none());
    }

    #[test]
    fn create_request_rejects_blank_story_and_bad_kind() {
        let blank: CreatePostRequest = serde_json::from_str(r#"{"story":"  "}"#).unwrap();
        assert!(blank.into_parts().is_err());

        let bad_kind: CreatePostRequest =
            serde_json::from_str(r#"{"story":"x","kind":"victory"}"#).unwrap();
        assert!(bad_kind.into_parts().is_err());
    }

    #[test]
    fn vote_request_bounds() {
        assert_eq!(VoteRequest { value: 0 }.value().unwrap(), 0);
        assert_eq!(VoteRequest { value: 100 }.value().unwrap(), 100);
        assert!(VoteRequest { value: 101 }.value().is_err());
        assert!(VoteRequest { value: -1 }.value().is_err());
    }

    #[test]
    fn post_view_carries_band() {
        let mut post = Post::pending(
            PostKind::Cost,
            "sarah".to_string(),
            None,
            "won".to_string(),
            None,
        );
        post.display_score = 90;
        post.judgment = JudgmentPhase::Resolved;
        let view = PostView::from_post(post, cooked::now_ms());
        assert_eq!(view.band.label, "PYRRHIC VICTORY");
        assert!(!view.is_analyzing);
        assert_eq!(view.time_ago, "Just now");
    }
}
