use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, patch, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::{
    BandQuery, BandResponse, CommentRequest, CreatePostRequest, FeedQuery, LeaderboardQuery,
    LoginRequest, PostView, ProfileResponse, VoteRequest, VoteResponse,
};
use cooked::board::Board;
use cooked::config::AppConfig;
use cooked::feed::PostFeed;
use cooked::judgment::{JudgeRequest, JudgmentResult};
use cooked::llm::{JudgeService, LlmClient};
use cooked::scoring::{classify_band, VoteScorer};
use cooked::user::{LocalStore, ProfileUpdate, Session, User};
use cooked::{now_ms, Comment, CookedError, CookedResult, PostKind};

const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

pub async fn build_board(config: &AppConfig) -> Result<Board, String> {
    let store = LocalStore::load(config.storage.path.clone()).await?;
    let session = Session::restore(Arc::new(store)).await?;
    let feed = if config.feed.seed_demo_posts {
        PostFeed::with_demo_posts()
    } else {
        PostFeed::default()
    };

    let client = LlmClient::from_env(&config.judge);
    match client.as_ref() {
        Some(client) => tracing::info!(model = client.model(), "Gemini judge configured"),
        None => tracing::warn!("GEMINI_API_KEY not set, judgments will use fallbacks"),
    }

    // Leave headroom past the HTTP timeout so the fallback path can answer.
    let judge_timeout = Duration::from_millis(config.judge.timeout_ms.saturating_add(5_000));

    Ok(Board::new(
        Arc::new(session),
        Arc::new(feed),
        VoteScorer::new(config.scoring.clone()),
        JudgeService::new(client),
        judge_timeout,
    ))
}

pub fn router(board: Board) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/judge", post(judge_handler))
        .route("/api/session", get(session_handler))
        .route("/api/session/login", post(login_handler))
        .route("/api/session/logout", post(logout_handler))
        .route("/api/session/profile", patch(profile_update_handler))
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/events", get(events_handler))
        .route("/api/posts/:id", get(get_post))
        .route("/api/posts/:id/vote", post(vote_handler))
        .route("/api/posts/:id/respect", post(respect_handler))
        .route("/api/posts/:id/laugh", post(laugh_handler))
        .route("/api/posts/:id/w", post(w_handler))
        .route("/api/posts/:id/l", post(l_handler))
        .route("/api/posts/:id/comments", post(comment_handler))
        .route("/api/users/:username", get(profile_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/api/bands", get(band_handler))
        .with_state(board)
}

pub async fn serve(config: AppConfig) -> Result<(), String> {
    let board = build_board(&config).await?;

    let web_root = config.server.web_root.clone();
    let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
    let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));

    let app = router(board)
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    tracing::info!(%addr, "serving roast board");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn judge_handler(
    State(board): State<Board>,
    Json(request): Json<JudgeRequest>,
) -> CookedResult<Json<JudgmentResult>> {
    if request.story.trim().is_empty() {
        return Err(CookedError::Validation("Story is required".to_string()));
    }
    Ok(Json(board.judge().judge(&request).await))
}

async fn session_handler(State(board): State<Board>) -> Json<Option<User>> {
    Json(board.viewer().await)
}

async fn login_handler(
    State(board): State<Board>,
    Json(request): Json<LoginRequest>,
) -> CookedResult<Json<User>> {
    let user = board.session().login(&request.username).await?;
    Ok(Json(user))
}

async fn logout_handler(State(board): State<Board>) -> CookedResult<StatusCode> {
    board.session().logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn profile_update_handler(
    State(board): State<Board>,
    Json(update): Json<ProfileUpdate>,
) -> CookedResult<Json<User>> {
    let user = board.session().update_profile(update).await?;
    Ok(Json(user))
}

async fn list_posts(
    State(board): State<Board>,
    Query(query): Query<FeedQuery>,
) -> CookedResult<Json<Vec<PostView>>> {
    let kind = query.kind().map_err(CookedError::Validation)?;
    let posts = board.feed().list(kind).await;
    Ok(Json(PostView::from_posts(posts, now_ms())))
}

async fn create_post(
    State(board): State<Board>,
    Json(request): Json<CreatePostRequest>,
) -> CookedResult<(StatusCode, Json<PostView>)> {
    // Auth comes first so a logged-out viewer always gets the login prompt.
    board.session().require_viewer().await?;
    let (kind, story, image) = request.into_parts().map_err(CookedError::Validation)?;
    let post = board.submit_post(kind, &story, image).await?;
    Ok((StatusCode::ACCEPTED, Json(PostView::from_post(post, now_ms()))))
}

async fn get_post(
    State(board): State<Board>,
    Path(post_id): Path<String>,
) -> CookedResult<Json<PostView>> {
    let post = board
        .feed()
        .get(&post_id)
        .await
        .ok_or(CookedError::NotFound(post_id))?;
    Ok(Json(PostView::from_post(post, now_ms())))
}

async fn vote_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> CookedResult<Json<VoteResponse>> {
    board.session().require_viewer().await?;
    let value = request.value().map_err(CookedError::Validation)?;
    let (outcome, post) = board.vote(&post_id, value).await?;
    Ok(Json(VoteResponse::new(
        outcome,
        PostView::from_post(post, now_ms()),
    )))
}

async fn respect_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
) -> CookedResult<Json<PostView>> {
    let post = board.respect(&post_id).await?;
    Ok(Json(PostView::from_post(post, now_ms())))
}

async fn laugh_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
) -> CookedResult<Json<PostView>> {
    let post = board.laugh(&post_id).await?;
    Ok(Json(PostView::from_post(post, now_ms())))
}

async fn w_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
) -> CookedResult<Json<PostView>> {
    let post = board.toggle_w(&post_id).await?;
    Ok(Json(PostView::from_post(post, now_ms())))
}

async fn l_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
) -> CookedResult<Json<PostView>> {
    let post = board.toggle_l(&post_id).await?;
    Ok(Json(PostView::from_post(post, now_ms())))
}

async fn comment_handler(
    State(board): State<Board>,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> CookedResult<(StatusCode, Json<Comment>)> {
    let comment = board.comment(&post_id, &request.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn profile_handler(
    State(board): State<Board>,
    Path(username): Path<String>,
) -> Json<ProfileResponse> {
    let (posts, stats) = board.profile(&username).await;
    Json(ProfileResponse {
        username,
        posts: PostView::from_posts(posts, now_ms()),
        stats,
    })
}

async fn leaderboard_handler(
    State(board): State<Board>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Vec<PostView>> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT).min(50);
    let posts = board.feed().leaderboard(limit).await;
    Json(PostView::from_posts(posts, now_ms()))
}

async fn band_handler(Query(query): Query<BandQuery>) -> CookedResult<Json<BandResponse>> {
    if !(0..=100).contains(&query.score) {
        return Err(CookedError::Validation(format!(
            "score must be between 0 and 100: {}",
            query.score
        )));
    }
    let kind = crate::api::parse_kind(query.kind.as_deref())
        .map_err(CookedError::Validation)?
        .unwrap_or(PostKind::Shame);
    let score = query.score as u8;
    Ok(Json(BandResponse {
        score,
        kind,
        band: classify_band(score, kind),
    }))
}

async fn events_handler(
    State(board): State<Board>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let stream = BroadcastStream::new(board.subscribe()).filter_map(|event| match event {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.event.clone()).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8)))
}
