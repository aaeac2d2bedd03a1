use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::feed::{PostFeed, ProfileStats};
use crate::judgment::{ImagePayload, JudgeRequest, JudgmentResult};
use crate::llm::JudgeService;
use crate::scoring::{self, VoteOutcome, VoteScorer};
use crate::user::{Session, User};
use crate::{now_ms, Comment, CookedError, CookedResult, Post, PostKind};

#[derive(Debug, Clone, Serialize)]
pub struct FeedEvent {
    pub event: String,
    pub post_id: String,
    pub timestamp_ms: i64,
}

/// Everything a request handler needs, passed around explicitly.
#[derive(Clone)]
pub struct Board {
    session: Arc<Session>,
    feed: Arc<PostFeed>,
    scorer: VoteScorer,
    judge: JudgeService,
    judge_timeout: Duration,
    events: broadcast::Sender<FeedEvent>,
}

impl Board {
    pub fn new(
        session: Arc<Session>,
        feed: Arc<PostFeed>,
        scorer: VoteScorer,
        judge: JudgeService,
        judge_timeout: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            session,
            feed,
            scorer,
            judge,
            judge_timeout,
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn feed(&self) -> &PostFeed {
        &self.feed
    }

    pub fn judge(&self) -> &JudgeService {
        &self.judge
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Creates a pending post and judges it in the background.
    pub async fn submit_post(
        &self,
        kind: PostKind,
        story: &str,
        image: Option<String>,
    ) -> CookedResult<Post> {
        let viewer = self.session.require_viewer().await?;
        let story = story.trim();
        if story.is_empty() {
            return Err(CookedError::Validation("story is required".to_string()));
        }
        let image = image.filter(|raw| !raw.trim().is_empty());
        if let Some(raw) = image.as_deref() {
            ImagePayload::parse(raw).map_err(CookedError::Validation)?;
        }

        let post = Post::pending(
            kind,
            viewer.username.clone(),
            Some(viewer.id.clone()),
            story.to_string(),
            image.clone(),
        );
        self.feed.prepend(post.clone()).await;
        self.emit("created", &post.id);
        tracing::info!(post_id = %post.id, author = %viewer.username, kind = kind.label(), "post submitted");

        let request = JudgeRequest {
            story: story.to_string(),
            image_base64: image,
        };
        let judge = self.judge.clone();
        let judge_timeout = self.judge_timeout;
        let worker = tokio::spawn(async move {
            tokio::time::timeout(judge_timeout, judge.judge(&request))
                .await
                .map_err(|_| "judgment timed out".to_string())
        });

        // A panicking worker still has to move the post out of analyzing.
        let board = self.clone();
        let post_id = post.id.clone();
        tokio::spawn(async move {
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(err) => Err(format!("judgment task failed: {}", err)),
            };
            if let Err(err) = board.complete_judgment(&post_id, outcome).await {
                tracing::warn!(post_id = %post_id, error = %err, "judged post disappeared");
            }
        });

        Ok(post)
    }

    pub async fn complete_judgment(
        &self,
        post_id: &str,
        outcome: Result<JudgmentResult, String>,
    ) -> CookedResult<Post> {
        let (applied, post) = self
            .feed
            .update(post_id, |post| post.resolve_judgment(outcome))
            .await?;
        if applied {
            tracing::info!(post_id = %post.id, score = post.ai_score, "post judged");
            self.emit("judged", post_id);
        }
        Ok(post)
    }

    pub async fn vote(&self, post_id: &str, value: u8) -> CookedResult<(VoteOutcome, Post)> {
        self.session.require_viewer().await?;
        if value > 100 {
            return Err(CookedError::Validation(
                "vote must be between 0 and 100".to_string(),
            ));
        }
        let scorer = self.scorer;
        let (outcome, post) = self
            .feed
            .update(post_id, |post| scorer.submit_vote(post, value))
            .await?;
        if matches!(outcome, VoteOutcome::Accepted { .. }) {
            self.emit("updated", post_id);
        }
        Ok((outcome, post))
    }

    pub async fn respect(&self, post_id: &str) -> CookedResult<Post> {
        self.session.require_viewer().await?;
        let (_, post) = self.feed.update(post_id, scoring::toggle_respect).await?;
        self.emit("updated", post_id);
        Ok(post)
    }

    pub async fn laugh(&self, post_id: &str) -> CookedResult<Post> {
        self.session.require_viewer().await?;
        let (_, post) = self.feed.update(post_id, scoring::add_laugh).await?;
        self.emit("updated", post_id);
        Ok(post)
    }

    /// W is only offered on cost posts.
    pub async fn toggle_w(&self, post_id: &str) -> CookedResult<Post> {
        self.toggle_marker(post_id, PostKind::Cost, scoring::toggle_w)
            .await
    }

    /// L is only offered on shame posts.
    pub async fn toggle_l(&self, post_id: &str) -> CookedResult<Post> {
        self.toggle_marker(post_id, PostKind::Shame, scoring::toggle_l)
            .await
    }

    async fn toggle_marker(
        &self,
        post_id: &str,
        kind: PostKind,
        toggle: fn(&mut Post) -> bool,
    ) -> CookedResult<Post> {
        self.session.require_viewer().await?;
        let (toggled, post) = self
            .feed
            .update(post_id, |post| {
                if post.kind == kind {
                    Some(toggle(post))
                } else {
                    None
                }
            })
            .await?;
        if toggled.is_none() {
            return Err(CookedError::Unsupported(format!(
                "{} posts do not take that reaction",
                post.kind.label()
            )));
        }
        self.emit("updated", post_id);
        Ok(post)
    }

    pub async fn comment(&self, post_id: &str, text: &str) -> CookedResult<Comment> {
        let viewer = self.session.require_viewer().await?;
        let now = now_ms();
        let (result, _) = self
            .feed
            .update(post_id, |post| {
                scoring::add_comment(post, &viewer.username, Some(&viewer.id), text, now)
                    .cloned()
            })
            .await?;
        let comment = result?;
        self.emit("updated", post_id);
        Ok(comment)
    }

    pub async fn profile(&self, username: &str) -> (Vec<Post>, ProfileStats) {
        let posts = self.feed.by_author(username).await;
        let stats = crate::feed::profile_stats(&posts);
        (posts, stats)
    }

    pub async fn viewer(&self) -> Option<User> {
        self.session.current_user().await
    }

    fn emit(&self, event: &str, post_id: &str) {
        let _ = self.events.send(FeedEvent {
            event: event.to_string(),
            post_id: post_id.to_string(),
            timestamp_ms: now_ms(),
        });
    }
}
