use std::sync::Arc;

use crate::{
    config::Config,
    dto::TrendingParams,
    errors::ClientResult,
    mutation::MutationEngine,
    remote::{FeedService, RemoteClient},
    session::{FileSessionStore, SessionHandle, SessionStore},
    store::FollowStore,
    views::{FeedScreen, FeedSource, NotificationsScreen, PostScreen, ProfileScreen, SearchScreen},
};

// ============================================================================
// APPLICATION STATE - Shared by every screen
// ============================================================================
/// Cheap to clone: every field is a handle onto shared state.
///
/// The follow store is the only entity state shared across screens; posts,
/// comments and notifications live in caches owned by each screen.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionHandle,
    pub api: Arc<dyn FeedService>,
    pub follows: FollowStore,
    pub engine: MutationEngine,
}

impl AppState {
    /// Production wiring: file-backed session, HTTP backend.
    pub fn new(config: Config) -> ClientResult<Self> {
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.session_path));
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn SessionStore>) -> ClientResult<Self> {
        let session = SessionHandle::new(store);
        let api = Arc::new(RemoteClient::new(&config, session.clone())?);
        Ok(Self::with_service(config, session, api))
    }

    pub fn with_service(config: Config, session: SessionHandle, api: Arc<dyn FeedService>) -> Self {
        let follows = FollowStore::new(session.user_id());
        let engine = MutationEngine::new(Arc::clone(&api), session.clone(), follows.clone());
        Self {
            config: Arc::new(config),
            session,
            api,
            follows,
            engine,
        }
    }

    pub fn home(&self) -> FeedScreen {
        FeedScreen::new(self, FeedSource::Home)
    }

    pub fn trending(&self, params: TrendingParams) -> FeedScreen {
        FeedScreen::new(self, FeedSource::Trending(params))
    }

    /// `None` opens the signed-in user's own profile.
    pub fn profile(&self, user_id: Option<&str>) -> ProfileScreen {
        ProfileScreen::new(self, user_id.map(str::to_string))
    }

    pub fn post(&self, post_id: &str) -> PostScreen {
        PostScreen::new(self, post_id)
    }

    pub fn notifications(&self) -> NotificationsScreen {
        NotificationsScreen::new(self)
    }

    pub fn search(&self) -> SearchScreen {
        SearchScreen::new(self)
    }
}
