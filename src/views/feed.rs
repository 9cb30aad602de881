use std::{collections::BTreeSet, sync::Arc};

use dashmap::DashMap;
use tracing::debug;

use super::{CommentRow, PostCard, ViewStatus, comment_row};
use crate::{
    cache::{CommentCache, PostCache},
    dto::TrendingParams,
    errors::{ClientResult, MutationResult},
    models::{Comment, Post, PostId, UserId},
    states::AppState,
};

/// Where a feed gets its posts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Home,
    Trending(TrendingParams),
    User(UserId),
}

#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub posts: Vec<PostCard>,
    pub loading: bool,
    pub error: Option<String>,
    pub signed_out: bool,
}

/// A list of post cards with inline comment threads.
#[derive(Clone)]
pub struct FeedScreen {
    app: AppState,
    source: FeedSource,
    posts: PostCache,
    threads: Arc<DashMap<PostId, CommentCache>>,
    status: ViewStatus,
}

impl FeedScreen {
    pub(crate) fn new(app: &AppState, source: FeedSource) -> Self {
        Self {
            app: app.clone(),
            source,
            posts: PostCache::default(),
            threads: Arc::new(DashMap::new()),
            status: ViewStatus::default(),
        }
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    /// Refetches the feed, replacing whatever the screen held.
    pub async fn load(&self) -> ClientResult<()> {
        self.status.start_loading();
        let api = &self.app.api;
        let fetched = match &self.source {
            FeedSource::Home => api.list_posts().await,
            FeedSource::Trending(params) => api.trending_posts(params).await,
            FeedSource::User(user_id) => api.user_posts(user_id).await,
        };
        match fetched {
            Ok(posts) => {
                self.show(posts).await;
                self.status.finish_loading();
                Ok(())
            }
            Err(err) => {
                self.status.client_failed(&err);
                Err(err)
            }
        }
    }

    /// Installs an already fetched list, seeding follow state for every
    /// author on it.
    pub(crate) async fn show(&self, posts: Vec<Post>) {
        let authors: BTreeSet<UserId> = posts.iter().map(|p| p.author.id.clone()).collect();
        self.posts.replace_all(posts);
        self.threads.clear();

        if !self.app.session.is_signed_in() {
            return;
        }
        for author in authors {
            if let Err(err) = self.app.engine.seed_follow(&author).await {
                debug!("Follow state for {} unknown: {}", author, err);
            }
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let session = &self.app.session;
        let engine = &self.app.engine;
        FeedSnapshot {
            posts: self
                .posts
                .snapshot()
                .into_iter()
                .map(|post| PostCard::build(post, session, engine))
                .collect(),
            loading: self.status.loading(),
            error: self.status.error(),
            signed_out: self.status.signed_out(),
        }
    }

    pub async fn like(&self, post_id: &str) -> MutationResult<Post> {
        let result = self.app.engine.toggle_post_like(&self.posts, post_id).await;
        self.status.track(result)
    }

    pub async fn follow(&self, user_id: &str) -> MutationResult<bool> {
        let result = self.app.engine.toggle_follow(user_id).await;
        self.status.track(result)
    }

    pub async fn create_post(&self, content: &str, image: Option<String>) -> MutationResult<Post> {
        let result = self.app.engine.create_post(&self.posts, content, image).await;
        self.status.track(result)
    }

    pub async fn edit_post(&self, post_id: &str, content: &str) -> MutationResult<Post> {
        let result = self.app.engine.edit_post(&self.posts, post_id, content).await;
        self.status.track(result)
    }

    pub async fn delete_post(&self, post_id: &str) -> MutationResult<()> {
        let result = self.app.engine.delete_post(&self.posts, post_id).await;
        if result.is_ok() {
            self.threads.remove(post_id);
        }
        self.status.track(result)
    }

    /// Expands the comment thread under a card, fetching it on first open.
    pub async fn open_comments(&self, post_id: &str) -> ClientResult<Vec<CommentRow>> {
        if !self.threads.contains_key(post_id) {
            let comments = self.app.api.list_comments(post_id).await.inspect_err(|err| {
                self.status.client_failed(err);
            })?;
            self.threads
                .insert(post_id.to_string(), CommentCache::new(comments));
        }
        Ok(self.comments(post_id))
    }

    pub fn comments(&self, post_id: &str) -> Vec<CommentRow> {
        let session = &self.app.session;
        let engine = &self.app.engine;
        self.thread(post_id)
            .snapshot()
            .into_iter()
            .map(|comment| comment_row(comment, session, engine))
            .collect()
    }

    /// Posts a comment under `post_id`. The card's comment count follows
    /// the confirmed comment.
    pub async fn submit_comment(&self, post_id: &str, text: &str) -> MutationResult<Comment> {
        let thread = self.thread(post_id);
        let result = self.app.engine.add_comment(&thread, post_id, text).await;
        if let Ok(comment) = &result {
            self.posts.update(post_id, |post| post.comments.push(comment.id.clone()));
        }
        self.status.track(result)
    }

    pub async fn like_comment(&self, post_id: &str, comment_id: &str) -> MutationResult<Comment> {
        let thread = self.thread(post_id);
        let result = self.app.engine.toggle_comment_like(&thread, comment_id).await;
        self.status.track(result)
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> MutationResult<()> {
        let thread = self.thread(post_id);
        let result = self.app.engine.delete_comment(&thread, comment_id).await;
        if result.is_ok() {
            self.posts
                .update(post_id, |post| post.comments.retain(|id| id != comment_id));
        }
        self.status.track(result)
    }

    fn thread(&self, post_id: &str) -> CommentCache {
        self.threads
            .entry(post_id.to_string())
            .or_default()
            .value()
            .clone()
    }
}
