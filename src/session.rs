use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::UserId;

/// Signed-in user, persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Durable storage for the session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| warn!("Ignoring corrupt session file {}: {}", self.path.display(), e))
            .ok()
    }

    fn save(&self, session: &Session) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, body)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Process-only store, used by tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, session: &Session) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Shared handle to the current session.
///
/// Every authenticated request reads the token through this handle at call
/// time, so ending the session takes effect for requests issued afterwards.
#[derive(Clone)]
pub struct SessionHandle {
    current: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    /// Restores whatever the store holds.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let restored = store.load();
        if let Some(session) = &restored {
            debug!("Restored session for {}", session.username);
        }
        Self {
            current: Arc::new(RwLock::new(restored)),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::default()))
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read(|s| s.token.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read(|s| s.user_id.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    pub fn is_current_user(&self, user_id: &str) -> bool {
        self.read(|s| s.user_id == user_id).unwrap_or(false)
    }

    pub fn begin(&self, session: Session) {
        if let Err(e) = self.store.save(&session) {
            warn!("Failed to persist session: {}", e);
        }
        info!("Signed in as {}", session.username);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn set_profile_picture(&self, url: Option<String>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_mut() {
            if session.profile_picture == url {
                return;
            }
            session.profile_picture = url;
            if let Err(e) = self.store.save(session) {
                warn!("Failed to persist session: {}", e);
            }
        }
    }

    pub fn end(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored session: {}", e);
        }
        if let Some(session) = previous {
            info!("Signed out {}", session.username);
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}
