use tracing::{info, warn};
use validator::Validate;

use super::{EntityKind, MutationEngine};
use crate::{
    cache::PostCache,
    dto::CreatePostRequest,
    errors::{MutationError, MutationResult},
    models::Post,
};

impl MutationEngine {
    /// Publishes a post. There is no id to show before the server assigns
    /// one, so the feed only changes once the post is confirmed.
    pub async fn create_post(
        &self,
        posts: &PostCache,
        content: &str,
        image: Option<String>,
    ) -> MutationResult<Post> {
        let session = self.signed_in()?;
        let request = CreatePostRequest::new(content, image);
        request.validate()?;
        let _guard = self.acquire(EntityKind::Composer, &session.user_id)?;

        let created = self.api.create_post(&request).await?;
        info!("Post created: {}", created.id);
        posts.push_front(created.clone());
        Ok(created)
    }

    /// Rewrites the content of one of the signed-in user's posts.
    pub async fn edit_post(&self, posts: &PostCache, post_id: &str, content: &str) -> MutationResult<Post> {
        let session = self.signed_in()?;
        let current = posts.get(post_id).ok_or(MutationError::NotFound("Post"))?;
        if !current.is_authored_by(&session.user_id) {
            return Err(MutationError::NotAuthor);
        }
        let request = CreatePostRequest::new(content, current.image.clone());
        request.validate()?;
        let _guard = self.acquire(EntityKind::Post, post_id)?;

        let previous = posts
            .update(post_id, |p| std::mem::replace(&mut p.content, request.content.clone()))
            .ok_or(MutationError::NotFound("Post"))?;

        match self.api.update_post(post_id, &request).await {
            Ok(confirmed) => {
                // Keep the locally known like set and comments; the update
                // endpoint may return an unpopulated document.
                let reconciled = posts.update(post_id, |p| {
                    p.content = confirmed.content.clone();
                    p.image = confirmed.image.clone();
                    p.clone()
                });
                Ok(reconciled.unwrap_or(confirmed))
            }
            Err(err) => {
                warn!("Rolling back edit of post {}: {}", post_id, err);
                posts.update(post_id, |p| p.content = previous);
                Err(err.into())
            }
        }
    }

    /// Removes one of the signed-in user's posts from the list immediately.
    pub async fn delete_post(&self, posts: &PostCache, post_id: &str) -> MutationResult<()> {
        let session = self.signed_in()?;
        let post = posts.get(post_id).ok_or(MutationError::NotFound("Post"))?;
        if !post.is_authored_by(&session.user_id) {
            return Err(MutationError::NotAuthor);
        }
        let _guard = self.acquire(EntityKind::Post, post_id)?;

        let Some((index, removed)) = posts.remove(post_id) else {
            return Err(MutationError::NotFound("Post"));
        };

        match self.api.delete_post(post_id).await {
            Ok(()) => {
                info!("Post deleted: {}", post_id);
                Ok(())
            }
            Err(err) => {
                warn!("Restoring post {}: {}", post_id, err);
                posts.insert_at(index, removed);
                Err(err.into())
            }
        }
    }
}
