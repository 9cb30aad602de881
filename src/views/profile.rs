use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{FeedScreen, FeedSnapshot, FeedSource, ViewStatus};
use crate::{
    errors::{ClientError, ClientResult, MutationError, MutationResult},
    models::{UserId, UserProfile},
    mutation::EntityKind,
    states::AppState,
};

#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    pub profile: Option<UserProfile>,
    pub is_own: bool,
    /// `None` on the user's own profile.
    pub following: Option<bool>,
    pub follow_pending: bool,
    pub feed: FeedSnapshot,
    pub loading: bool,
    pub error: Option<String>,
    pub signed_out: bool,
}

/// A user's profile header over their posts.
#[derive(Clone)]
pub struct ProfileScreen {
    app: AppState,
    target: Option<UserId>,
    profile: Arc<RwLock<Option<UserProfile>>>,
    feed: Arc<RwLock<Option<FeedScreen>>>,
    status: ViewStatus,
}

impl ProfileScreen {
    pub(crate) fn new(app: &AppState, target: Option<UserId>) -> Self {
        Self {
            app: app.clone(),
            target,
            profile: Arc::new(RwLock::new(None)),
            feed: Arc::new(RwLock::new(None)),
            status: ViewStatus::default(),
        }
    }

    /// Fetches the profile then the user's posts. Without a target this is
    /// the signed-in user's own profile, whose picture is cached in the
    /// session.
    pub async fn load(&self) -> ClientResult<()> {
        self.status.start_loading();
        let profile = match self.fetch_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                self.status.client_failed(&err);
                return Err(err);
            }
        };

        let feed = FeedScreen::new(&self.app, FeedSource::User(profile.id.clone()));
        let user_id = profile.id.clone();
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile);
        *self.feed.write().unwrap_or_else(PoisonError::into_inner) = Some(feed.clone());

        if let Err(err) = feed.load().await {
            self.status.client_failed(&err);
            return Err(err);
        }
        if let Err(err) = self.app.engine.seed_follow(&user_id).await {
            debug!("Follow state for {} unknown: {}", user_id, err);
        }
        self.status.finish_loading();
        Ok(())
    }

    async fn fetch_profile(&self) -> ClientResult<UserProfile> {
        match &self.target {
            Some(user_id) if !self.app.session.is_current_user(user_id) => {
                self.app.api.user_profile(user_id).await
            }
            _ => {
                if !self.app.session.is_signed_in() {
                    return Err(ClientError::Unauthenticated);
                }
                let profile = self.app.api.current_user().await?;
                self.app
                    .session
                    .set_profile_picture(profile.profile_picture.clone());
                Ok(profile)
            }
        }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The posts list, once the profile has loaded.
    pub fn feed(&self) -> Option<FeedScreen> {
        self.feed.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        let profile = self.profile();
        let user_id = profile.as_ref().map(|p| p.id.clone()).or_else(|| self.target.clone());
        let is_own = match &user_id {
            Some(id) => self.app.session.is_current_user(id),
            None => true,
        };
        let follows = self.app.engine.follows();
        let following = user_id
            .as_deref()
            .filter(|_| !is_own)
            .map(|id| follows.is_following(id));
        let follow_pending = user_id
            .as_deref()
            .is_some_and(|id| self.app.engine.is_pending(EntityKind::User, id));
        let feed = self.feed().map(|feed| feed.snapshot()).unwrap_or_default();

        ProfileSnapshot {
            profile,
            is_own,
            following,
            follow_pending,
            feed,
            loading: self.status.loading(),
            error: self.status.error(),
            signed_out: self.status.signed_out(),
        }
    }

    /// Toggles following the profile's owner.
    pub async fn follow(&self) -> MutationResult<bool> {
        let target = self
            .profile()
            .map(|p| p.id)
            .or_else(|| self.target.clone())
            .ok_or(MutationError::NotFound("User"));
        let result = match target {
            Ok(target) => self.app.engine.toggle_follow(&target).await,
            Err(err) => Err(err),
        };
        self.status.track(result)
    }
}
