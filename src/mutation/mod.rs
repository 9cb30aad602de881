//! Optimistic mutation engine.
//!
//! Every user-initiated mutation follows the same protocol: check local
//! preconditions (including the per-entity in-flight flag), apply the change
//! to the local replica synchronously, call the backend, then either
//! reconcile with the confirmed payload or roll back to the exact prior
//! value. Each operation resolves to a `MutationResult`; none panic and none
//! are retried.

mod comments;
mod follow;
mod guard;
mod likes;
mod notifications;
mod posts;

use std::sync::Arc;

pub use guard::{EntityKind, InFlight, InFlightGuard};
pub use likes::{TapOutcome, TapTracker};

use crate::{
    errors::{ClientError, MutationError, MutationResult},
    models::UserRef,
    remote::FeedService,
    session::{Session, SessionHandle},
    store::FollowStore,
};

#[derive(Clone)]
pub struct MutationEngine {
    api: Arc<dyn FeedService>,
    session: SessionHandle,
    follows: FollowStore,
    in_flight: InFlight,
}

impl MutationEngine {
    pub fn new(api: Arc<dyn FeedService>, session: SessionHandle, follows: FollowStore) -> Self {
        Self {
            api,
            session,
            follows,
            in_flight: InFlight::default(),
        }
    }

    pub fn follows(&self) -> &FollowStore {
        &self.follows
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub fn is_pending(&self, kind: EntityKind, id: &str) -> bool {
        self.in_flight.is_active(kind, id)
    }

    fn signed_in(&self) -> MutationResult<Session> {
        self.session
            .current()
            .ok_or(MutationError::Remote(ClientError::Unauthenticated))
    }

    fn acquire(&self, kind: EntityKind, id: &str) -> MutationResult<InFlightGuard> {
        self.in_flight
            .acquire(kind, id)
            .ok_or(MutationError::InFlight)
    }
}

fn author_of(session: &Session) -> UserRef {
    UserRef {
        id: session.user_id.clone(),
        username: session.username.clone(),
        profile_picture: session.profile_picture.clone(),
    }
}
