use std::collections::BTreeSet;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use super::{EntityKind, MutationEngine, author_of};
use crate::{
    cache::CommentCache,
    dto::CommentRequest,
    errors::{MutationError, MutationResult},
    models::{Comment, SYNTHETIC_PREFIX},
};

impl MutationEngine {
    /// Appends a synthetic comment authored by the signed-in user, then
    /// swaps it for the server's copy or removes it if the call fails.
    pub async fn add_comment(
        &self,
        comments: &CommentCache,
        post_id: &str,
        text: &str,
    ) -> MutationResult<Comment> {
        let session = self.signed_in()?;
        let request = CommentRequest::new(text);
        request.validate()?;
        let _guard = self.acquire(EntityKind::Thread, post_id)?;

        let synthetic = Comment {
            id: format!("{SYNTHETIC_PREFIX}{}", Uuid::new_v4()),
            post: post_id.to_string(),
            author: author_of(&session),
            content: request.content.clone(),
            created_at: Utc::now(),
            likes: BTreeSet::new(),
        };
        let synthetic_id = synthetic.id.clone();
        comments.push_back(synthetic);

        match self.api.add_comment(post_id, &request).await {
            Ok(mut confirmed) => {
                // Fill in an unpopulated author from what we know locally.
                if confirmed.author.username.is_empty() {
                    confirmed.author = author_of(&session);
                }
                if confirmed.post.is_empty() {
                    confirmed.post = post_id.to_string();
                }
                if !comments.replace(&synthetic_id, confirmed.clone()) {
                    comments.push_back(confirmed.clone());
                }
                Ok(confirmed)
            }
            Err(err) => {
                warn!("Removing unsent comment on post {}: {}", post_id, err);
                comments.remove(&synthetic_id);
                Err(err.into())
            }
        }
    }

    /// Removes one of the signed-in user's comments, putting it back at its
    /// original position if the server refuses.
    pub async fn delete_comment(&self, comments: &CommentCache, comment_id: &str) -> MutationResult<()> {
        let session = self.signed_in()?;
        let comment = comments
            .get(comment_id)
            .ok_or(MutationError::NotFound("Comment"))?;
        if comment.author.id != session.user_id {
            return Err(MutationError::NotAuthor);
        }
        if comment.is_synthetic() {
            return Err(MutationError::InFlight);
        }
        let _guard = self.acquire(EntityKind::Comment, comment_id)?;

        let Some((index, removed)) = comments.remove(comment_id) else {
            return Err(MutationError::NotFound("Comment"));
        };

        match self.api.delete_comment(comment_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Restoring comment {}: {}", comment_id, err);
                comments.insert_at(index, removed);
                Err(err.into())
            }
        }
    }
}
