//! Scripted in-process backend for unit tests.
//!
//! Calls are recorded as `op:id`. A call can be made to fail with
//! [`FakeFeed::fail`] or to block until [`FakeFeed::release`] with
//! [`FakeFeed::hold`]. Keys are either the bare op (`like_post`) or the
//! op plus id (`like_post:p1`); the more specific key wins.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Notify;

use crate::{
    dto::{
        AuthResponse, CommentRequest, CreatePostRequest, LikesResponse, LoginRequest,
        NotificationPage, PaginationParams, RegisterRequest, SearchResults, TrendingParams,
    },
    errors::{ClientError, ClientResult},
    models::{Comment, Notification, Post, UserId, UserProfile, UserRef},
    remote::FeedService,
};

#[derive(Default)]
pub(crate) struct FakeFeed {
    failures: DashMap<String, ClientError>,
    gates: DashMap<String, Arc<Notify>>,
    held: DashMap<String, Arc<Notify>>,
    calls: Mutex<Vec<String>>,
    pub(crate) posts: Mutex<Vec<Post>>,
    pub(crate) comments: Mutex<Vec<Comment>>,
    pub(crate) notifications: Mutex<Vec<Notification>>,
    pub(crate) likes: DashMap<String, BTreeSet<UserId>>,
    pub(crate) following: DashMap<UserId, bool>,
    pub(crate) search_results: DashMap<String, SearchResults>,
    pub(crate) profile: Mutex<Option<UserProfile>>,
}

pub(crate) fn user(id: &str) -> UserRef {
    UserRef {
        id: id.into(),
        username: format!("{id}_user"),
        profile_picture: None,
    }
}

pub(crate) fn post(id: &str, author: &str, likes: &[&str]) -> Post {
    Post {
        id: id.into(),
        author: user(author),
        content: format!("content of {id}"),
        image: None,
        created_at: Utc::now(),
        likes: likes.iter().map(|l| l.to_string()).collect(),
        comments: Vec::new(),
    }
}

pub(crate) fn comment(id: &str, post_id: &str, author: &str) -> Comment {
    Comment {
        id: id.into(),
        post: post_id.into(),
        author: user(author),
        content: format!("comment {id}"),
        created_at: Utc::now(),
        likes: BTreeSet::new(),
    }
}

pub(crate) fn notification(id: &str, read: bool) -> Notification {
    Notification {
        id: id.into(),
        recipient: "me".into(),
        sender: user("bob"),
        post: None,
        kind: Some("like".into()),
        content: "liked your post".into(),
        read,
        created_at: Utc::now(),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeFeed {
    pub(crate) fn fail(&self, key: &str, err: ClientError) {
        self.failures.insert(key.to_string(), err);
    }

    pub(crate) fn clear_failure(&self, key: &str) {
        self.failures.remove(key);
    }

    /// The next call matching `key` blocks until released.
    pub(crate) fn hold(&self, key: &str) {
        let gate = Arc::new(Notify::new());
        self.gates.insert(key.to_string(), gate.clone());
        self.held.insert(key.to_string(), gate);
    }

    pub(crate) fn release(&self, key: &str) {
        if let Some((_, gate)) = self.held.remove(key) {
            gate.notify_one();
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.as_str() == op || c.starts_with(&format!("{op}:")))
            .count()
    }

    async fn enter(&self, op: &str, id: &str) -> ClientResult<()> {
        let specific = if id.is_empty() {
            op.to_string()
        } else {
            format!("{op}:{id}")
        };
        lock(&self.calls).push(specific.clone());

        let gate = self
            .gates
            .remove(&specific)
            .or_else(|| self.gates.remove(op))
            .map(|(_, gate)| gate);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self
            .failures
            .get(&specific)
            .or_else(|| self.failures.get(op))
            .map(|e| e.value().clone());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeedService for FakeFeed {
    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        self.enter("login", &request.email).await?;
        Ok(AuthResponse {
            token: "tok-me".into(),
            user: user("me"),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        self.enter("register", &request.username).await?;
        Ok(AuthResponse {
            token: "tok-me".into(),
            user: user("me"),
        })
    }

    async fn current_user(&self) -> ClientResult<UserProfile> {
        self.enter("current_user", "").await?;
        lock(&self.profile).clone().ok_or(ClientError::Unauthenticated)
    }

    async fn user_profile(&self, user_id: &str) -> ClientResult<UserProfile> {
        self.enter("user_profile", user_id).await?;
        let profile = lock(&self.profile).clone();
        Ok(profile.unwrap_or_else(|| UserProfile {
            id: user_id.into(),
            username: format!("{user_id}_user"),
            email: None,
            bio: None,
            profile_picture: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: None,
        }))
    }

    async fn follow(&self, user_id: &str) -> ClientResult<()> {
        self.enter("follow", user_id).await?;
        self.following.insert(user_id.into(), true);
        Ok(())
    }

    async fn unfollow(&self, user_id: &str) -> ClientResult<()> {
        self.enter("unfollow", user_id).await?;
        self.following.insert(user_id.into(), false);
        Ok(())
    }

    async fn check_following(&self, user_id: &str) -> ClientResult<bool> {
        self.enter("check_following", user_id).await?;
        Ok(self.following.get(user_id).map(|f| *f.value()).unwrap_or(false))
    }

    async fn search_users(&self, query: &str) -> ClientResult<Vec<UserRef>> {
        self.enter("search_users", query).await?;
        Ok(self
            .search_results
            .get(query)
            .map(|r| r.value().users.clone())
            .unwrap_or_default())
    }

    async fn list_posts(&self) -> ClientResult<Vec<Post>> {
        self.enter("list_posts", "").await?;
        Ok(lock(&self.posts).clone())
    }

    async fn user_posts(&self, user_id: &str) -> ClientResult<Vec<Post>> {
        self.enter("user_posts", user_id).await?;
        Ok(lock(&self.posts)
            .iter()
            .filter(|p| p.author.id == user_id)
            .cloned()
            .collect())
    }

    async fn trending_posts(&self, _params: &TrendingParams) -> ClientResult<Vec<Post>> {
        self.enter("trending_posts", "").await?;
        Ok(lock(&self.posts).clone())
    }

    async fn get_post(&self, post_id: &str) -> ClientResult<Post> {
        self.enter("get_post", post_id).await?;
        lock(&self.posts)
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(ClientError::ClientRejected {
                status: 404,
                message: "Post not found".into(),
            })
    }

    async fn create_post(&self, request: &CreatePostRequest) -> ClientResult<Post> {
        self.enter("create_post", "").await?;
        let mut created = post("srv-post", "me", &[]);
        created.content = request.content.clone();
        created.image = request.image.clone();
        Ok(created)
    }

    async fn update_post(&self, post_id: &str, request: &CreatePostRequest) -> ClientResult<Post> {
        self.enter("update_post", post_id).await?;
        let mut updated = post(post_id, "me", &[]);
        updated.content = request.content.clone();
        Ok(updated)
    }

    async fn delete_post(&self, post_id: &str) -> ClientResult<()> {
        self.enter("delete_post", post_id).await
    }

    async fn like_post(&self, post_id: &str) -> ClientResult<LikesResponse> {
        self.enter("like_post", post_id).await?;
        Ok(LikesResponse {
            likes: self.likes.get(post_id).map(|l| l.value().clone()),
        })
    }

    async fn search(&self, query: &str) -> ClientResult<SearchResults> {
        self.enter("search", query).await?;
        Ok(self
            .search_results
            .get(query)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn list_comments(&self, post_id: &str) -> ClientResult<Vec<Comment>> {
        self.enter("list_comments", post_id).await?;
        Ok(lock(&self.comments)
            .iter()
            .filter(|c| c.post == post_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, post_id: &str, request: &CommentRequest) -> ClientResult<Comment> {
        self.enter("add_comment", post_id).await?;
        let mut created = comment("srv-comment", post_id, "me");
        created.content = request.content.clone();
        // The backend sometimes omits the populated author.
        created.author.username = String::new();
        Ok(created)
    }

    async fn like_comment(&self, comment_id: &str) -> ClientResult<LikesResponse> {
        self.enter("like_comment", comment_id).await?;
        Ok(LikesResponse {
            likes: self.likes.get(comment_id).map(|l| l.value().clone()),
        })
    }

    async fn delete_comment(&self, comment_id: &str) -> ClientResult<()> {
        self.enter("delete_comment", comment_id).await
    }

    async fn notifications(&self, page: PaginationParams) -> ClientResult<NotificationPage> {
        self.enter("notifications", &page.page.to_string()).await?;
        Ok(NotificationPage {
            notifications: lock(&self.notifications).clone(),
            current_page: page.page,
            total_pages: 2,
        })
    }

    async fn mark_read(&self, notification_id: &str) -> ClientResult<()> {
        self.enter("mark_read", notification_id).await
    }

    async fn mark_all_read(&self) -> ClientResult<()> {
        self.enter("mark_all_read", "").await
    }
}
