use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tracing::debug;

use crate::models::UserId;

/// Which users the signed-in user follows, shared by every mounted view.
///
/// `Clone` hands out another handle to the same map, so a toggle made
/// through one view is visible to all others without a refetch. The store
/// never holds an entry for the owner's own id.
#[derive(Clone, Default)]
pub struct FollowStore {
    edges: Arc<DashMap<UserId, bool>>,
    owner: Arc<RwLock<Option<UserId>>>,
}

impl FollowStore {
    pub fn new(owner: Option<UserId>) -> Self {
        let store = Self::default();
        store.reset(owner);
        store
    }

    /// Drops every entry and rebinds the store to a new signed-in user.
    pub fn reset(&self, owner: Option<UserId>) {
        self.edges.clear();
        debug!("Follow store reset for {:?}", owner);
        *self.owner.write().unwrap_or_else(PoisonError::into_inner) = owner;
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(user_id)
    }

    /// Known state for `user_id`, `None` if never observed.
    pub fn get(&self, user_id: &str) -> Option<bool> {
        self.edges.get(user_id).map(|entry| *entry.value())
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.get(user_id).unwrap_or(false)
    }

    /// Returns `false` (and stores nothing) for the owner's own id.
    pub fn set(&self, user_id: &str, following: bool) -> bool {
        if self.is_owner(user_id) {
            return false;
        }
        self.edges.insert(user_id.to_string(), following);
        true
    }

    /// Stores `following` only when nothing is known for `user_id` yet and
    /// returns whatever the store holds afterwards. `None` for the owner.
    pub fn set_if_absent(&self, user_id: &str, following: bool) -> Option<bool> {
        if self.is_owner(user_id) {
            return None;
        }
        Some(*self.edges.entry(user_id.to_string()).or_insert(following))
    }

    /// Puts back a value captured with [`FollowStore::get`].
    pub fn restore(&self, user_id: &str, previous: Option<bool>) {
        match previous {
            Some(following) => {
                self.set(user_id, following);
            }
            None => {
                self.edges.remove(user_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
