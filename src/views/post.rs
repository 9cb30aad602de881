use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tracing::debug;

use super::{PostCard, ViewStatus, comment_row};
use crate::{
    cache::{CommentCache, PostCache},
    errors::{ClientError, ClientResult, MutationError, MutationResult},
    models::{Comment, Post, PostId},
    mutation::{TapOutcome, TapTracker},
    states::AppState,
};

/// A comment as a thread shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub comment: Comment,
    pub liked: bool,
    pub likes_count: usize,
    pub is_own: bool,
    /// Still waiting for the server to assign an id.
    pub sending: bool,
    pub like_pending: bool,
}

#[derive(Debug, Clone)]
pub struct PostSnapshot {
    pub post: Option<PostCard>,
    pub comments: Vec<CommentRow>,
    /// Bumped once per like applied by a double tap.
    pub heart_bursts: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub signed_out: bool,
}

/// One post with its full comment thread.
#[derive(Clone)]
pub struct PostScreen {
    app: AppState,
    post_id: PostId,
    post: PostCache,
    comments: CommentCache,
    taps: Arc<TapTracker>,
    heart_bursts: Arc<AtomicUsize>,
    status: ViewStatus,
}

impl PostScreen {
    pub(crate) fn new(app: &AppState, post_id: &str) -> Self {
        Self {
            app: app.clone(),
            post_id: post_id.to_string(),
            post: PostCache::default(),
            comments: CommentCache::default(),
            taps: Arc::new(TapTracker::new(app.config.double_tap_window)),
            heart_bursts: Arc::new(AtomicUsize::new(0)),
            status: ViewStatus::default(),
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub async fn load(&self) -> ClientResult<()> {
        self.status.start_loading();
        let api = &self.app.api;
        let fetched = async {
            let post = api.get_post(&self.post_id).await?;
            let comments = api.list_comments(&self.post_id).await?;
            Ok::<_, ClientError>((post, comments))
        };
        let (post, comments) = fetched.await.inspect_err(|err| self.status.client_failed(err))?;

        let author = post.author.id.clone();
        self.post.replace_all(vec![post]);
        self.comments.replace_all(comments);
        self.status.finish_loading();

        if self.app.session.is_signed_in() {
            if let Err(err) = self.app.engine.seed_follow(&author).await {
                debug!("Follow state for {} unknown: {}", author, err);
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> PostSnapshot {
        let session = &self.app.session;
        let engine = &self.app.engine;
        PostSnapshot {
            post: self
                .post
                .get(&self.post_id)
                .map(|post| PostCard::build(post, session, engine)),
            comments: self
                .comments
                .snapshot()
                .into_iter()
                .map(|comment| comment_row(comment, session, engine))
                .collect(),
            heart_bursts: self.heart_bursts.load(Ordering::Relaxed),
            loading: self.status.loading(),
            error: self.status.error(),
            signed_out: self.status.signed_out(),
        }
    }

    /// One tap on the post body. The second tap inside the window likes an
    /// unliked post; it never unlikes.
    pub async fn tap(&self) -> TapOutcome {
        let outcome = self
            .app
            .engine
            .double_tap(&self.post, &self.post_id, &self.taps)
            .await;
        match &outcome {
            TapOutcome::Liked(_) => {
                self.heart_bursts.fetch_add(1, Ordering::Relaxed);
                self.status.clear_error();
            }
            TapOutcome::Failed(err) => {
                self.status.record_error(err);
            }
            TapOutcome::SingleTap | TapOutcome::Ignored => {}
        }
        outcome
    }

    pub async fn like(&self) -> MutationResult<Post> {
        let result = self.app.engine.toggle_post_like(&self.post, &self.post_id).await;
        self.status.track(result)
    }

    pub async fn follow_author(&self) -> MutationResult<bool> {
        let author = self
            .post
            .get(&self.post_id)
            .map(|post| post.author.id)
            .ok_or(MutationError::NotFound("Post"));
        let result = match author {
            Ok(author) => self.app.engine.toggle_follow(&author).await,
            Err(err) => Err(err),
        };
        self.status.track(result)
    }

    pub async fn edit(&self, content: &str) -> MutationResult<Post> {
        let result = self.app.engine.edit_post(&self.post, &self.post_id, content).await;
        self.status.track(result)
    }

    pub async fn delete(&self) -> MutationResult<()> {
        let result = self.app.engine.delete_post(&self.post, &self.post_id).await;
        self.status.track(result)
    }

    pub async fn submit_comment(&self, text: &str) -> MutationResult<Comment> {
        let result = self
            .app
            .engine
            .add_comment(&self.comments, &self.post_id, text)
            .await;
        if let Ok(comment) = &result {
            self.post
                .update(&self.post_id, |post| post.comments.push(comment.id.clone()));
        }
        self.status.track(result)
    }

    pub async fn like_comment(&self, comment_id: &str) -> MutationResult<Comment> {
        let result = self.app.engine.toggle_comment_like(&self.comments, comment_id).await;
        self.status.track(result)
    }

    pub async fn delete_comment(&self, comment_id: &str) -> MutationResult<()> {
        let result = self.app.engine.delete_comment(&self.comments, comment_id).await;
        if result.is_ok() {
            self.post
                .update(&self.post_id, |post| post.comments.retain(|id| id != comment_id));
        }
        self.status.track(result)
    }
}
