use serde::{Deserialize, Serialize};

use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// How many community votes the AI score counts as.
    pub ai_weight: f64,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self { ai_weight: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted { display_score: u8 },
    AlreadyVoted,
    StillAnalyzing,
}

/// Folds community votes into a damped mean anchored on the AI score.
#[derive(Debug, Clone, Copy)]
pub struct VoteScorer {
    ai_weight: f64,
}

impl Default for VoteScorer {
    fn default() -> Self {
        Self::new(VoteConfig::default())
    }
}

impl VoteScorer {
    pub fn new(config: VoteConfig) -> Self {
        let ai_weight = if config.ai_weight.is_finite() {
            config.ai_weight.max(0.0)
        } else {
            1.0
        };
        Self { ai_weight }
    }

    pub fn ai_weight(&self) -> f64 {
        self.ai_weight
    }

    pub fn submit_vote(&self, post: &mut Post, raw_value: u8) -> VoteOutcome {
        if post.has_voted {
            return VoteOutcome::AlreadyVoted;
        }
        if post.is_analyzing() {
            return VoteOutcome::StillAnalyzing;
        }

        let value = raw_value.min(100);
        let count = post.community_votes.count + 1;
        let total = post.community_votes.total_score + value as u32;
        let display_score = self.blend(post.ai_score, count, total);

        post.community_votes.count = count;
        post.community_votes.total_score = total;
        post.display_score = display_score;
        post.has_voted = true;

        VoteOutcome::Accepted { display_score }
    }

    pub fn blend(&self, ai_score: u8, count: u32, total: u32) -> u8 {
        let denominator = count as f64 + self.ai_weight;
        if denominator <= 0.0 {
            return ai_score;
        }
        let numerator = total as f64 + ai_score as f64 * self.ai_weight;
        (numerator / denominator).round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JudgmentPhase, PostKind};

    fn judged(ai_score: u8) -> Post {
        let mut post = Post::pending(
            PostKind::Shame,
            "dave".to_string(),
            None,
            "story".to_string(),
            None,
        );
        post.ai_score = ai_score;
        post.display_score = ai_score;
        post.judgment = JudgmentPhase::Resolved;
        post
    }

    #[test]
    fn ai_score_counts_as_one_vote() {
        let scorer = VoteScorer::default();
        let mut post = judged(95);
        assert_eq!(
            scorer.submit_vote(&mut post, 55),
            VoteOutcome::Accepted { display_score: 75 }
        );
        assert_eq!(post.community_votes.count, 1);
        assert_eq!(post.community_votes.total_score, 55);
        assert!(post.has_voted);
    }

    #[test]
    fn existing_votes_dilute_ai_anchor() {
        let scorer = VoteScorer::default();
        let mut post = judged(65);
        post.community_votes.count = 5;
        post.community_votes.total_score = 325;

        scorer.submit_vote(&mut post, 0);

        // (325 + 0 + 65) / 7 = 55.71
        assert_eq!(post.display_score, 56);
    }

    #[test]
    fn halves_round_up() {
        let scorer = VoteScorer::default();
        let mut post = judged(50);
        scorer.submit_vote(&mut post, 51);
        assert_eq!(post.display_score, 51);
    }

    #[test]
    fn pending_post_ignores_votes() {
        let scorer = VoteScorer::default();
        let mut post = judged(40);
        post.judgment = JudgmentPhase::Pending;
        assert_eq!(scorer.submit_vote(&mut post, 90), VoteOutcome::StillAnalyzing);
        assert_eq!(post.community_votes.count, 0);
        assert!(!post.has_voted);
    }

    #[test]
    fn heavier_ai_weight_pulls_toward_ai() {
        let scorer = VoteScorer::new(VoteConfig { ai_weight: 3.0 });
        let mut post = judged(100);
        scorer.submit_vote(&mut post, 0);
        assert_eq!(post.display_score, 75);
    }

    #[test]
    fn zero_weight_is_plain_mean() {
        let scorer = VoteScorer::new(VoteConfig { ai_weight: 0.0 });
        assert_eq!(scorer.blend(100, 2, 80), 40);
        assert_eq!(scorer.blend(100, 0, 0), 100);
    }

    #[test]
    fn non_finite_weight_falls_back_to_one() {
        let scorer = VoteScorer::new(VoteConfig {
            ai_weight: f64::NAN,
        });
        assert!((scorer.ai_weight() - 1.0).abs() < 1e-9);
    }
}
