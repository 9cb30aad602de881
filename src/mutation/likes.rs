use std::{
    collections::BTreeSet,
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::time::Instant;
use tracing::{debug, warn};

use super::{EntityKind, MutationEngine};
use crate::{
    cache::{CommentCache, EntityCache, PostCache},
    dto::LikesResponse,
    errors::{ClientResult, MutationError, MutationResult},
    models::{Comment, Entity, Post, UserId},
};

trait Likeable: Entity {
    const NAME: &'static str;

    fn likes_mut(&mut self) -> &mut BTreeSet<UserId>;

    fn apply_like(&mut self, user_id: &str, liked: bool) -> bool;
}

impl Likeable for Post {
    const NAME: &'static str = "Post";

    fn likes_mut(&mut self) -> &mut BTreeSet<UserId> {
        &mut self.likes
    }

    fn apply_like(&mut self, user_id: &str, liked: bool) -> bool {
        self.set_liked(user_id, liked)
    }
}

impl Likeable for Comment {
    const NAME: &'static str = "Comment";

    fn likes_mut(&mut self) -> &mut BTreeSet<UserId> {
        &mut self.likes
    }

    fn apply_like(&mut self, user_id: &str, liked: bool) -> bool {
        self.set_liked(user_id, liked)
    }
}

/// Result of a tap on a post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// First tap of a possible pair; nothing happened.
    SingleTap,
    /// The double tap liked the post. Show the heart burst.
    Liked(Post),
    /// Already liked or a like is still saving. Double tap never unlikes.
    Ignored,
    Failed(MutationError),
}

impl TapOutcome {
    pub fn shows_heart_burst(&self) -> bool {
        matches!(self, TapOutcome::Liked(_))
    }
}

/// Detects two taps within a window.
#[derive(Debug)]
pub struct TapTracker {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl TapTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Records a tap. `true` when it completes a double tap; the pair is
    /// then consumed so a third tap starts over.
    pub fn register(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(previous) if now.duration_since(previous) < self.window => {
                *last = None;
                true
            }
            _ => {
                *last = Some(now);
                false
            }
        }
    }
}

impl MutationEngine {
    /// Flips the signed-in user's like on a post.
    pub async fn toggle_post_like(&self, posts: &PostCache, post_id: &str) -> MutationResult<Post> {
        let session = self.signed_in()?;
        let _guard = self.acquire(EntityKind::Post, post_id)?;
        let liked = !posts
            .get(post_id)
            .ok_or(MutationError::NotFound(Post::NAME))?
            .is_liked_by(&session.user_id);

        send_like(posts, post_id, &session.user_id, liked, self.api.like_post(post_id)).await
    }

    /// Double-tap handling: a completed double tap on an unliked post likes
    /// it exactly once.
    pub async fn double_tap(&self, posts: &PostCache, post_id: &str, taps: &TapTracker) -> TapOutcome {
        if !taps.register() {
            return TapOutcome::SingleTap;
        }
        let session = match self.signed_in() {
            Ok(session) => session,
            Err(err) => return TapOutcome::Failed(err),
        };
        let Some(_guard) = self.in_flight.acquire(EntityKind::Post, post_id) else {
            debug!("Double tap on {} ignored, like in flight", post_id);
            return TapOutcome::Ignored;
        };

        match posts.get(post_id) {
            None => TapOutcome::Failed(MutationError::NotFound(Post::NAME)),
            Some(post) if post.is_liked_by(&session.user_id) => TapOutcome::Ignored,
            Some(_) => {
                let call = self.api.like_post(post_id);
                match send_like(posts, post_id, &session.user_id, true, call).await {
                    Ok(post) => TapOutcome::Liked(post),
                    Err(err) => TapOutcome::Failed(err),
                }
            }
        }
    }

    /// Flips the signed-in user's like on a comment.
    pub async fn toggle_comment_like(
        &self,
        comments: &CommentCache,
        comment_id: &str,
    ) -> MutationResult<Comment> {
        let session = self.signed_in()?;
        let _guard = self.acquire(EntityKind::Comment, comment_id)?;
        let comment = comments
            .get(comment_id)
            .ok_or(MutationError::NotFound(Comment::NAME))?;
        if comment.is_synthetic() {
            return Err(MutationError::InFlight);
        }
        let liked = !comment.is_liked_by(&session.user_id);

        let call = self.api.like_comment(comment_id);
        send_like(comments, comment_id, &session.user_id, liked, call).await
    }
}

/// Applies the like locally, awaits `call`, then reconciles with the
/// server's like set or restores the prior one.
async fn send_like<T, F>(
    cache: &EntityCache<T>,
    id: &str,
    user_id: &str,
    liked: bool,
    call: F,
) -> MutationResult<T>
where
    T: Likeable,
    F: Future<Output = ClientResult<LikesResponse>>,
{
    let (before, mut optimistic) = cache
        .update(id, |item| {
            let before = item.likes_mut().clone();
            item.apply_like(user_id, liked);
            (before, item.clone())
        })
        .ok_or(MutationError::NotFound(T::NAME))?;

    match call.await {
        Ok(confirmed) => {
            let reconciled = cache.update(id, |item| {
                if let Some(likes) = confirmed.likes.clone() {
                    *item.likes_mut() = likes;
                }
                item.clone()
            });
            Ok(reconciled.unwrap_or_else(|| {
                // Entry left the cache while the call ran (screen refetch).
                if let Some(likes) = confirmed.likes {
                    *optimistic.likes_mut() = likes;
                }
                optimistic
            }))
        }
        Err(err) => {
            warn!("Rolling back like on {} {}: {}", T::NAME, id, err);
            cache.update(id, |item| *item.likes_mut() = before);
            Err(err.into())
        }
    }
}
