//! Screens assembled from the sync layer.
//!
//! Each screen owns its entity caches (dropped with the screen), reads the
//! shared follow store, and exposes a read-only snapshot plus a small set of
//! imperative actions. Failures never escape as panics: actions return the
//! mutation result and the short message is also kept on the snapshot.

mod feed;
mod notifications;
mod post;
mod profile;
mod search;

use std::sync::{Arc, PoisonError, RwLock};

pub use feed::{FeedScreen, FeedSnapshot, FeedSource};
pub use notifications::{NotificationsScreen, NotificationsSnapshot};
pub use post::{CommentRow, PostScreen, PostSnapshot};
pub use profile::{ProfileScreen, ProfileSnapshot};
pub use search::{SearchScreen, SearchSnapshot};

use crate::{
    errors::{ClientError, MutationError},
    models::{Comment, Post},
    mutation::{EntityKind, MutationEngine},
    session::SessionHandle,
};

/// Loading and error flags shared by every screen.
#[derive(Debug, Clone, Default)]
pub(crate) struct ViewStatus {
    inner: Arc<RwLock<StatusInner>>,
}

#[derive(Debug, Clone, Default)]
struct StatusInner {
    loading: bool,
    error: Option<String>,
    signed_out: bool,
}

impl ViewStatus {
    fn with<R>(&self, f: impl FnOnce(&mut StatusInner) -> R) -> R {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn start_loading(&self) {
        self.with(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    pub(crate) fn finish_loading(&self) {
        self.with(|s| s.loading = false);
    }

    pub(crate) fn client_failed(&self, err: &ClientError) {
        self.with(|s| {
            s.loading = false;
            s.error = Some(err.user_message());
            s.signed_out |= err.is_auth_failure();
        });
    }

    pub(crate) fn clear_error(&self) {
        self.with(|s| s.error = None);
    }

    pub(crate) fn record_error(&self, err: &MutationError) {
        self.with(|s| {
            s.error = Some(err.user_message());
            s.signed_out |= err.is_auth_failure();
        });
    }

    /// Records the outcome of a user action and hands it back unchanged.
    pub(crate) fn track<T>(&self, result: Result<T, MutationError>) -> Result<T, MutationError> {
        match &result {
            Ok(_) => self.clear_error(),
            Err(err) => self.record_error(err),
        }
        result
    }

    pub(crate) fn loading(&self) -> bool {
        self.with(|s| s.loading)
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.with(|s| s.error.clone())
    }

    /// The backend no longer accepts our credentials; the view should send
    /// the user to the login screen.
    pub(crate) fn signed_out(&self) -> bool {
        self.with(|s| s.signed_out)
    }
}

/// A post as a card shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub post: Post,
    pub liked: bool,
    pub likes_count: usize,
    pub comments_count: usize,
    pub is_own: bool,
    /// `None` on the user's own posts, where no follow button is shown.
    pub following_author: Option<bool>,
    pub like_pending: bool,
}

impl PostCard {
    pub(crate) fn build(post: Post, session: &SessionHandle, engine: &MutationEngine) -> Self {
        let me = session.user_id().unwrap_or_default();
        let is_own = post.is_authored_by(&me);
        Self {
            liked: post.is_liked_by(&me),
            likes_count: post.likes_count(),
            comments_count: post.comments.len(),
            is_own,
            following_author: (!is_own).then(|| engine.follows().is_following(&post.author.id)),
            like_pending: engine.is_pending(EntityKind::Post, &post.id),
            post,
        }
    }
}

/// A comment as a thread shows it.
pub(crate) fn comment_row(comment: Comment, session: &SessionHandle, engine: &MutationEngine) -> CommentRow {
    let me = session.user_id().unwrap_or_default();
    CommentRow {
        liked: comment.is_liked_by(&me),
        likes_count: comment.likes_count(),
        is_own: comment.author.id == me,
        sending: comment.is_synthetic(),
        like_pending: engine.is_pending(EntityKind::Comment, &comment.id),
        comment,
    }
}
