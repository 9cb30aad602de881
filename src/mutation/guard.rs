use std::sync::Arc;

use dashmap::DashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Post,
    Comment,
    /// Comment submission on a post's thread.
    Thread,
    User,
    Notification,
    /// Post composer of the signed-in user.
    Composer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    kind: EntityKind,
    id: String,
}

/// Per-entity in-flight flags.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<DashSet<Key>>,
}

impl InFlight {
    /// `None` while another mutation on the same entity is outstanding.
    pub fn acquire(&self, kind: EntityKind, id: &str) -> Option<InFlightGuard> {
        let key = Key {
            kind,
            id: id.to_string(),
        };
        if !self.active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    pub fn is_active(&self, kind: EntityKind, id: &str) -> bool {
        self.active.contains(&Key {
            kind,
            id: id.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Clears its flag when dropped, whichever way the mutation resolved.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<DashSet<Key>>,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
