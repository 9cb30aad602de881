use tracing::{debug, warn};

use super::{EntityKind, MutationEngine};
use crate::errors::{MutationError, MutationResult};

impl MutationEngine {
    /// Follows or unfollows `target`, returning the new state. The shared
    /// follow store changes immediately so every mounted view sees it.
    pub async fn toggle_follow(&self, target: &str) -> MutationResult<bool> {
        let session = self.signed_in()?;
        if target == session.user_id {
            return Err(MutationError::SelfFollow);
        }
        let _guard = self.acquire(EntityKind::User, target)?;

        let previous = self.follows.get(target);
        let following = !previous.unwrap_or(false);
        self.follows.set(target, following);

        let result = if following {
            self.api.follow(target).await
        } else {
            self.api.unfollow(target).await
        };

        match result {
            Ok(()) => {
                debug!("Follow state for {} is now {}", target, following);
                Ok(following)
            }
            Err(err) => {
                warn!("Rolling back follow toggle on {}: {}", target, err);
                self.follows.restore(target, previous);
                Err(err.into())
            }
        }
    }

    /// Seeds the shared store from the backend when a view first shows
    /// `target`. The signed-in user is never looked up. An answer that
    /// arrives after a toggle on `target` started never overwrites it.
    pub async fn seed_follow(&self, target: &str) -> MutationResult<bool> {
        let session = self.signed_in()?;
        if target == session.user_id {
            return Ok(false);
        }
        if let Some(known) = self.follows.get(target) {
            return Ok(known);
        }

        let following = self.api.check_following(target).await?;
        Ok(self
            .follows
            .set_if_absent(target, following)
            .unwrap_or(following))
    }
}
