use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Comment, Entity, Notification, Post};

/// Per-screen replica of a server list, keyed by entity id and kept in
/// server order. Dropped with the screen that owns it.
#[derive(Debug)]
pub struct EntityCache<T> {
    items: Arc<RwLock<Vec<T>>>,
}

pub type PostCache = EntityCache<Post>;
pub type CommentCache = EntityCache<Comment>;
pub type NotificationCache = EntityCache<Notification>;

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T: Entity> EntityCache<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace_all(&self, items: Vec<T>) {
        *self.write() = items;
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.read().iter().find(|item| item.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().iter().any(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Applies `f` to the entry with `id`, if cached.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.write().iter_mut().find(|item| item.id() == id).map(f)
    }

    /// Applies `f` to every entry.
    pub fn update_all(&self, mut f: impl FnMut(&mut T)) {
        self.write().iter_mut().for_each(|item| f(item));
    }

    pub fn push_front(&self, item: T) {
        self.write().insert(0, item);
    }

    pub fn push_back(&self, item: T) {
        self.write().push(item);
    }

    /// Swaps the entry with `id` for `item` in place. Returns `false` when
    /// `id` is no longer cached.
    pub fn replace(&self, id: &str, item: T) -> bool {
        self.update(id, |slot| *slot = item).is_some()
    }

    /// Removes the entry and reports where it was, for a later
    /// [`EntityCache::insert_at`].
    pub fn remove(&self, id: &str) -> Option<(usize, T)> {
        let mut items = self.write();
        let index = items.iter().position(|item| item.id() == id)?;
        Some((index, items.remove(index)))
    }

    pub fn insert_at(&self, index: usize, item: T) {
        let mut items = self.write();
        let index = index.min(items.len());
        items.insert(index, item);
    }
}
