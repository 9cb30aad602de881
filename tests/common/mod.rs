//! In-process mock of the feed backend, served by axum on an ephemeral port.

#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use dashmap::{DashMap, DashSet};
use feedsync::{AppState, Config, session::FileSessionStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower_http::trace::TraceLayer;

pub const TOKEN: &str = "tok-alice";
pub const ME: &str = "alice";
pub const PASSWORD: &str = "secret123";

// ============================================================================
// ERRORS - Same body shape as the real backend
// ============================================================================
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    BadRequest(String),
    Status(StatusCode),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Status(status) => (status, "Internal server error".to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ============================================================================
// STATE
// ============================================================================
#[derive(Clone, Default)]
pub struct MockState {
    pub posts: Arc<Mutex<Vec<Value>>>,
    pub comments: Arc<Mutex<Vec<Value>>>,
    pub notifications: Arc<Mutex<Vec<Value>>>,
    pub likes: Arc<DashMap<String, BTreeSet<String>>>,
    pub follows: Arc<DashSet<String>>,
    /// Operation name -> status code every matching request fails with.
    pub faults: Arc<DashMap<&'static str, StatusCode>>,
    /// `METHOD path` of every request, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
    pub last_auth: Arc<Mutex<Option<String>>>,
}

impl MockState {
    pub fn fail(&self, op: &'static str, status: StatusCode) {
        self.faults.insert(op, status);
    }

    pub fn heal(&self, op: &'static str) {
        self.faults.remove(op);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }

    fn fault(&self, op: &'static str) -> Result<(), ApiError> {
        match self.faults.get(op) {
            Some(status) => Err(ApiError::Status(*status)),
            None => Ok(()),
        }
    }

    fn record(&self, line: String, headers: &HeaderMap) {
        self.requests.lock().unwrap().push(line);
        *self.last_auth.lock().unwrap() = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }

    fn authorize(&self, line: String, headers: &HeaderMap) -> Result<(), ApiError> {
        self.record(line, headers);
        let expected = format!("Bearer {TOKEN}");
        match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }

    fn with_likes(&self, mut post: Value) -> Value {
        let id = post["_id"].as_str().unwrap_or_default().to_string();
        let likes: Vec<String> = self
            .likes
            .get(&id)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default();
        post["likes"] = json!(likes);
        post
    }

    fn seeded() -> Self {
        let state = Self::default();
        *state.posts.lock().unwrap() = vec![
            json!({
                "_id": "p1",
                "user": { "_id": "bob", "username": "bob" },
                "content": "hello world",
                "createdAt": "2024-05-01T10:00:00Z",
                "comments": ["c1"]
            }),
            json!({
                "_id": "p2",
                "user": { "_id": ME, "username": ME },
                "content": "my first post",
                "createdAt": "2024-05-01T09:00:00Z",
                "comments": []
            }),
        ];
        *state.comments.lock().unwrap() = vec![json!({
            "_id": "c1",
            "post": "p1",
            "user": { "_id": "bob", "username": "bob" },
            "content": "first!",
            "createdAt": "2024-05-01T10:05:00Z",
            "likes": []
        })];
        *state.notifications.lock().unwrap() = vec![
            json!({
                "_id": "n1",
                "recipient": ME,
                "sender": { "_id": "bob", "username": "bob" },
                "post": { "_id": "p2" },
                "type": "like",
                "content": "bob liked your post",
                "read": false,
                "createdAt": "2024-05-01T11:00:00Z"
            }),
            json!({
                "_id": "n2",
                "recipient": ME,
                "sender": { "_id": "carol", "username": "carol" },
                "type": "follow",
                "content": "carol followed you",
                "read": false,
                "createdAt": "2024-05-01T12:00:00Z"
            }),
        ];
        state.likes.insert("p1".into(), BTreeSet::from(["carol".to_string()]));
        state
    }
}

// ============================================================================
// HANDLERS
// ============================================================================
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<MockState>, headers: HeaderMap, Json(body): Json<LoginBody>) -> Result<Json<Value>, ApiError> {
    state.record(format!("POST /auth/login {}", body.email), &headers);
    if body.password != PASSWORD {
        return Err(ApiError::BadRequest("Invalid credentials".into()));
    }
    Ok(Json(json!({
        "token": TOKEN,
        "user": { "_id": ME, "username": ME, "profilePicture": "https://cdn/alice.png" }
    })))
}

async fn me(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    state.authorize("GET /auth/me".into(), &headers)?;
    let following: Vec<String> = state.follows.iter().map(|f| f.key().clone()).collect();
    Ok(Json(json!({
        "_id": ME,
        "username": ME,
        "email": "alice@example.com",
        "profilePicture": "https://cdn/alice-v2.png",
        "followers": [],
        "following": following,
    })))
}

async fn check_following(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /auth/following/{id}"), &headers)?;
    Ok(Json(json!({ "isFollowing": state.follows.contains(&id) })))
}

async fn profile(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /users/profile/{id}"), &headers)?;
    Ok(Json(json!({ "_id": id, "username": id, "followers": [], "following": [] })))
}

async fn follow(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.authorize(format!("POST /users/follow/{id}"), &headers)?;
    state.fault("follow")?;
    state.follows.insert(id);
    Ok(StatusCode::OK)
}

async fn unfollow(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.authorize(format!("POST /users/unfollow/{id}"), &headers)?;
    state.fault("follow")?;
    state.follows.remove(&id);
    Ok(StatusCode::OK)
}

async fn list_posts(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    state.authorize("GET /posts".into(), &headers)?;
    state.fault("posts")?;
    let posts: Vec<Value> = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .cloned()
        .map(|p| state.with_likes(p))
        .collect();
    Ok(Json(json!(posts)))
}

async fn user_posts(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /posts/user/{id}"), &headers)?;
    let posts: Vec<Value> = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p["user"]["_id"] == id.as_str())
        .cloned()
        .map(|p| state.with_likes(p))
        .collect();
    Ok(Json(json!(posts)))
}

async fn get_post(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /posts/{id}"), &headers)?;
    let post = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .find(|p| p["_id"] == id.as_str())
        .cloned()
        .ok_or(ApiError::NotFound)?;
    Ok(Json(state.with_likes(post)))
}

#[derive(Deserialize)]
struct PostBody {
    content: String,
    image: Option<String>,
}

async fn create_post(State(state): State<MockState>, headers: HeaderMap, Json(body): Json<PostBody>) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.authorize("POST /posts".into(), &headers)?;
    if body.content.contains("spam") {
        return Err(ApiError::BadRequest("Post looks like spam".into()));
    }
    let mut posts = state.posts.lock().unwrap();
    let post = json!({
        "_id": format!("p{}", posts.len() + 1),
        "user": { "_id": ME, "username": ME },
        "content": body.content,
        "image": body.image,
        "likes": [],
        "comments": []
    });
    posts.insert(0, post.clone());
    Ok((StatusCode::CREATED, Json(post)))
}

async fn like_post(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("PUT /posts/like/{id}"), &headers)?;
    state.fault("like")?;
    let mut likes = state.likes.entry(id).or_default();
    if !likes.remove(ME) {
        likes.insert(ME.to_string());
    }
    Ok(Json(json!({ "likes": likes.iter().collect::<Vec<_>>() })))
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search(State(state): State<MockState>, headers: HeaderMap, Query(q): Query<SearchQuery>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /posts/search {}", q.query), &headers)?;
    state.fault("search")?;
    let needle = q.query.to_lowercase();
    let posts: Vec<Value> = state
        .posts
        .lock()
        .unwrap()
        .iter()
        .filter(|p| {
            p["content"]
                .as_str()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    let users: Vec<Value> = ["alice", "bob", "carol"]
        .into_iter()
        .filter(|u| u.contains(&needle))
        .map(|u| json!({ "_id": u, "username": u }))
        .collect();
    Ok(Json(json!({ "posts": posts, "users": users })))
}

async fn search_users(State(state): State<MockState>, headers: HeaderMap, Path(query): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /users/search/{query}"), &headers)?;
    state.fault("search_users")?;
    let needle = query.to_lowercase();
    let users: Vec<Value> = ["alice", "bob", "carol"]
        .into_iter()
        .filter(|u| u.starts_with(&needle))
        .map(|u| json!({ "_id": u, "username": u }))
        .collect();
    Ok(Json(json!(users)))
}

async fn list_comments(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /comments/post/{id}"), &headers)?;
    let comments: Vec<Value> = state
        .comments
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["post"] == id.as_str())
        .cloned()
        .collect();
    Ok(Json(json!(comments)))
}

#[derive(Deserialize)]
struct CommentBody {
    content: String,
}

async fn add_comment(State(state): State<MockState>, headers: HeaderMap, Path(post_id): Path<String>, Json(body): Json<CommentBody>) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.authorize(format!("POST /comments/{post_id}"), &headers)?;
    state.fault("comment")?;
    let mut comments = state.comments.lock().unwrap();
    // The author comes back unpopulated, as the real backend does on create.
    let comment = json!({
        "_id": format!("c{}", comments.len() + 1),
        "post": post_id,
        "user": { "_id": ME },
        "content": body.content,
        "likes": []
    });
    comments.push(comment.clone());
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.authorize(format!("DELETE /comments/{id}"), &headers)?;
    state.comments.lock().unwrap().retain(|c| c["_id"] != id.as_str());
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    limit: usize,
}

async fn notifications(State(state): State<MockState>, headers: HeaderMap, Query(q): Query<PageQuery>) -> Result<Json<Value>, ApiError> {
    state.authorize(format!("GET /notifications {} {}", q.page, q.limit), &headers)?;
    let all = state.notifications.lock().unwrap().clone();
    Ok(Json(json!({
        "notifications": all,
        "currentPage": q.page,
        "totalPages": 1,
    })))
}

async fn mark_read(State(state): State<MockState>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.authorize(format!("PUT /notifications/{id}/read"), &headers)?;
    state.fault("read")?;
    for n in state.notifications.lock().unwrap().iter_mut() {
        if n["_id"] == id.as_str() {
            n["read"] = json!(true);
        }
    }
    Ok(StatusCode::OK)
}

async fn mark_all_read(State(state): State<MockState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    state.authorize("PUT /notifications/read-all".into(), &headers)?;
    state.fault("read")?;
    for n in state.notifications.lock().unwrap().iter_mut() {
        n["read"] = json!(true);
    }
    Ok(StatusCode::OK)
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/following/{id}", get(check_following))
        .route("/users/profile/{id}", get(profile))
        .route("/users/search/{query}", get(search_users))
        .route("/users/follow/{id}", post(follow))
        .route("/users/unfollow/{id}", post(unfollow))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/search", get(search))
        .route("/posts/user/{id}", get(user_posts))
        .route("/posts/like/{id}", put(like_post))
        .route("/posts/{id}", get(get_post))
        .route("/comments/post/{id}", get(list_comments))
        .route("/comments/{id}", post(add_comment).delete(delete_comment))
        .route("/notifications", get(notifications))
        .route("/notifications/read-all", put(mark_all_read))
        .route("/notifications/{id}/read", put(mark_read))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// HARNESS
// ============================================================================
pub struct MockBackend {
    pub url: String,
    pub state: MockState,
    pub dir: TempDir,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            api_url: self.url.clone(),
            session_path: self.session_path(),
            search_debounce: Duration::from_millis(20),
            request_timeout: Some(Duration::from_secs(5)),
            ..Config::default()
        }
    }

    pub fn session_path(&self) -> std::path::PathBuf {
        self.dir.path().join("session.json")
    }

    /// A fresh client process sharing this backend and session file.
    pub fn app(&self) -> AppState {
        let config = self.config();
        let store = Arc::new(FileSessionStore::new(&config.session_path));
        AppState::with_store(config, store).unwrap()
    }

    pub async fn signed_in(&self) -> AppState {
        let app = self.app();
        app.login("alice@example.com", PASSWORD).await.unwrap();
        app
    }
}
