pub mod board;
pub mod config;
pub mod error;
pub mod feed;
pub mod judgment;
pub mod llm;
pub mod scoring;
pub mod user;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub use error::{CookedError, CookedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// Pure disaster.
    Shame,
    /// Won, but at what cost.
    Cost,
}

impl PostKind {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "shame" | "l" | "disaster" => Some(PostKind::Shame),
            "cost" | "w" | "pyrrhic" => Some(PostKind::Cost),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostKind::Shame => "shame",
            PostKind::Cost => "cost",
        }
    }
}

/// Where a post is in the AI judgment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgmentPhase {
    Pending,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityVotes {
    pub count: u32,
    pub total_score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub laughs: u32,
    pub respects: u32,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub author_id: Option<String>,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub kind: PostKind,
    pub author: String,
    pub author_id: Option<String>,
    pub story: String,
    pub image: Option<String>,
    pub timestamp: i64,
    pub ai_score: u8,
    pub display_score: u8,
    pub community_votes: CommunityVotes,
    pub verdict: String,
    pub judgment: JudgmentPhase,
    // Viewer flags live on the post itself: one session per board.
    pub has_voted: bool,
    pub has_marked_w: bool,
    pub has_marked_l: bool,
    pub reactions: ReactionCounts,
    pub comments: Vec<Comment>,
}

impl Post {
    /// A freshly submitted post, waiting for its judgment.
    pub fn pending(
        kind: PostKind,
        author: String,
        author_id: Option<String>,
        story: String,
        image: Option<String>,
    ) -> Self {
        Self {
            id: new_id(),
            kind,
            author,
            author_id,
            story,
            image,
            timestamp: now_ms(),
            ai_score: 0,
            display_score: 0,
            community_votes: CommunityVotes::default(),
            verdict: String::new(),
            judgment: JudgmentPhase::Pending,
            has_voted: false,
            has_marked_w: false,
            has_marked_l: false,
            reactions: ReactionCounts::default(),
            comments: Vec::new(),
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.judgment == JudgmentPhase::Pending
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}

pub fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub fn format_time_ago(timestamp: i64, now: i64) -> String {
    let seconds = (now - timestamp).max(0) / 1000;
    if seconds < 60 {
        return "Just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}
