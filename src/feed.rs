use serde::Serialize;
use std::cmp::Ordering;
use tokio::sync::RwLock;

use crate::scoring::BandTier;
use crate::{
    now_ms, Comment, CommunityVotes, CookedError, CookedResult, JudgmentPhase, Post, PostKind,
    ReactionCounts,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BandDistribution {
    pub safe: usize,
    pub medium: usize,
    pub well_done: usize,
    pub burnt: usize,
}

/// Profile title earned from the average display score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileRank {
    pub title: &'static str,
    pub color: &'static str,
}

impl ProfileRank {
    pub const RAW: ProfileRank = ProfileRank {
        title: "Raw (Uncooked)",
        color: "text-neutral-400",
    };

    pub fn for_average(total_posts: usize, average_score: u8) -> Self {
        if total_posts == 0 {
            return Self::RAW;
        }
        let (title, color) = match BandTier::from_score(average_score) {
            BandTier::Low => ("Lightly Seared", "text-green-500"),
            BandTier::Medium => ("Medium Rare", "text-yellow-500"),
            BandTier::High => ("Well Done", "text-orange-500"),
            BandTier::Critical => ("Burnt to a Crisp", "text-cook-accent"),
        };
        Self { title, color }
    }
}

impl Default for ProfileRank {
    fn default() -> Self {
        Self::RAW
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub total_posts: usize,
    pub total_respects: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    pub total_votes: u32,
    pub average_score: u8,
    pub distribution: BandDistribution,
    pub rank: ProfileRank,
}

/// The in-memory feed. Nothing here survives a restart.
pub struct PostFeed {
    posts: RwLock<Vec<Post>>,
}

impl Default for PostFeed {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PostFeed {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }

    pub fn with_demo_posts() -> Self {
        Self::new(demo_posts(now_ms()))
    }

    pub async fn prepend(&self, post: Post) {
        let mut guard = self.posts.write().await;
        guard.insert(0, post);
    }

    pub async fn get(&self, post_id: &str) -> Option<Post> {
        let guard = self.posts.read().await;
        guard.iter().find(|post| post.id == post_id).cloned()
    }

    /// Runs `f` against one post under the write lock.
    pub async fn update<T>(
        &self,
        post_id: &str,
        f: impl FnOnce(&mut Post) -> T,
    ) -> CookedResult<(T, Post)> {
        let mut guard = self.posts.write().await;
        let post = guard
            .iter_mut()
            .find(|post| post.id == post_id)
            .ok_or_else(|| CookedError::NotFound(post_id.to_string()))?;
        let value = f(post);
        Ok((value, post.clone()))
    }

    /// Analyzing posts first, then highest display score.
    pub async fn list(&self, kind: Option<PostKind>) -> Vec<Post> {
        let guard = self.posts.read().await;
        let mut posts: Vec<Post> = guard
            .iter()
            .filter(|post| kind.map_or(true, |kind| post.kind == kind))
            .cloned()
            .collect();
        posts.sort_by(feed_order);
        posts
    }

    pub async fn by_author(&self, username: &str) -> Vec<Post> {
        let guard = self.posts.read().await;
        let mut posts: Vec<Post> = guard
            .iter()
            .filter(|post| post.author == username)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        posts
    }

    pub async fn leaderboard(&self, limit: usize) -> Vec<Post> {
        let guard = self.posts.read().await;
        let mut posts: Vec<Post> = guard
            .iter()
            .filter(|post| !post.is_analyzing())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.display_score.cmp(&a.display_score));
        posts.truncate(limit);
        posts
    }
}

fn feed_order(a: &Post, b: &Post) -> Ordering {
    match (a.is_analyzing(), b.is_analyzing()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.display_score.cmp(&a.display_score),
    }
}

pub fn profile_stats(posts: &[Post]) -> ProfileStats {
    let mut stats = ProfileStats {
        total_posts: posts.len(),
        ..ProfileStats::default()
    };
    let mut score_sum = 0u32;

    for post in posts {
        stats.total_respects += post.reactions.respects;
        stats.total_wins += post.reactions.wins;
        stats.total_losses += post.reactions.losses;
        stats.total_votes += post.community_votes.count;
        score_sum += post.display_score as u32;

        match BandTier::from_score(post.display_score) {
            BandTier::Low => stats.distribution.safe += 1,
            BandTier::Medium => stats.distribution.medium += 1,
            BandTier::High => stats.distribution.well_done += 1,
            BandTier::Critical => stats.distribution.burnt += 1,
        }
    }

    if !posts.is_empty() {
        stats.average_score = (score_sum as f64 / posts.len() as f64).round() as u8;
    }
    stats.rank = ProfileRank::for_average(stats.total_posts, stats.average_score);
    stats
}

#[allow(clippy::too_many_arguments)]
fn demo_post(
    id: &str,
    kind: PostKind,
    author: &str,
    story: &str,
    timestamp: i64,
    score: u8,
    votes: CommunityVotes,
    verdict: &str,
    reactions: ReactionCounts,
) -> Post {
    Post {
        id: id.to_string(),
        kind,
        author: author.to_string(),
        author_id: None,
        story: story.to_string(),
        image: None,
        timestamp,
        ai_score: score,
        display_score: score,
        community_votes: votes,
        verdict: verdict.to_string(),
        judgment: JudgmentPhase::Resolved,
        has_voted: false,
        has_marked_w: false,
        has_marked_l: false,
        reactions,
        comments: Vec::new(),
    }
}

/// The three posts a fresh board opens with.
pub fn demo_posts(now: i64) -> Vec<Post> {
    let minute = 60 * 1000;

    let mut toilet = demo_post(
        "1",
        PostKind::Shame,
        "UnluckyDave",
        "Dropped my phone in the toilet. While fishing it out, my glasses fell in too. Flushed out of panic.",
        now - 120 * minute,
        95,
        CommunityVotes { count: 20, total_score: 1900 },
        "Double kill. Flush yourself next time, it's safer.",
        ReactionCounts { laughs: 42, respects: 12, wins: 0, losses: 85 },
    );
    toilet.comments.push(Comment {
        id: "c1".to_string(),
        author: "ToiletSurfer".to_string(),
        author_id: None,
        text: "Bro needs a leash for his glasses".to_string(),
        timestamp: now - 30 * minute,
    });

    let mut prod = demo_post(
        "2",
        PostKind::Cost,
        "Sarah_Codes",
        "Finally fixed the production bug that was keeping us awake for 48 hours. I accidentally deleted the entire user table in the process, but the bug IS gone.",
        now - 45 * minute,
        100,
        CommunityVotes { count: 50, total_score: 5000 },
        "Task failed successfully. You won the battle but nuked the war.",
        ReactionCounts { laughs: 128, respects: 85, wins: 240, losses: 0 },
    );
    prod.has_marked_w = true;

    let email = demo_post(
        "3",
        PostKind::Shame,
        "InternJim",
        "Replied \"Love you too\" to my boss's email about the quarterly report.",
        now - 10 * minute,
        65,
        CommunityVotes { count: 5, total_score: 325 },
        "HR is already typing the termination letter. Cringe.",
        ReactionCounts { laughs: 8, respects: 2, wins: 0, losses: 15 },
    );

    vec![toilet, prod, email]
}
