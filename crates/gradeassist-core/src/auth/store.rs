use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Session;

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Key holding the serialized user record
pub const USER_KEY: &str = "user";

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

/// Persistence for the current session.
///
/// Implementations must write and clear both keys together. A store that
/// finds only one of them reports no session at all.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// The stored bearer token, if any. Unreadable state counts as absent.
    fn token(&self) -> Option<String> {
        match self.load() {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                None
            }
        }
    }
}

/// On-disk layout: two string keys, the user record serialized as JSON text.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl StoredKeys {
    fn from_session(session: &Session) -> Result<Self> {
        let user = serde_json::to_string(&session.user).context("Failed to serialize user")?;
        Ok(Self {
            token: Some(session.token.clone()),
            user: Some(user),
        })
    }

    fn into_session(self) -> Option<Session> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                match serde_json::from_str(&user) {
                    Ok(user) => Some(Session { token, user }),
                    Err(e) => {
                        warn!(error = %e, "Stored user record is unreadable, ignoring session");
                        None
                    }
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Stored session is missing one of {}/{}, ignoring it", TOKEN_KEY, USER_KEY);
                None
            }
            _ => None,
        }
    }
}

/// Session persisted as `session.json` in the cache directory.
pub struct FileSessionStore {
    cache_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read_keys(path: &Path) -> Result<StoredKeys> {
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Self::read_keys(&path)?.into_session())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let path = self.path();
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;

        // Write-then-rename so readers never see one key without the other
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&StoredKeys::from_session(session)?)?;
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, &path).context("Failed to replace session file")?;

        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!(path = %path.display(), "Session cleared");
        }
        Ok(())
    }
}

/// Session kept in process memory.
#[derive(Default)]
pub struct MemorySessionStore {
    keys: Mutex<StoredKeys>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: &Session) -> Result<Self> {
        Ok(Self {
            keys: Mutex::new(StoredKeys::from_session(session)?),
        })
    }

    /// Raw presence of each key, for checking that they move together
    pub fn has_keys(&self) -> (bool, bool) {
        match self.keys.lock() {
            Ok(keys) => (keys.token.is_some(), keys.user.is_some()),
            Err(poisoned) => {
                let keys = poisoned.into_inner();
                (keys.token.is_some(), keys.user.is_some())
            }
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let keys = self.keys.lock().map_err(|_| anyhow!("Session lock poisoned"))?;
        let snapshot = StoredKeys {
            token: keys.token.clone(),
            user: keys.user.clone(),
        };
        Ok(snapshot.into_session())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let stored = StoredKeys::from_session(session)?;
        let mut keys = self.keys.lock().map_err(|_| anyhow!("Session lock poisoned"))?;
        *keys = stored;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut keys = self.keys.lock().map_err(|_| anyhow!("Session lock poisoned"))?;
        *keys = StoredKeys::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn sample_session() -> Session {
        let user: User = serde_json::from_str(
            r#"{"name":"A","email":"valid@x.com","role":"student"}"#,
        )
        .expect("parse user");
        Session::new("T", user)
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("nested"));

        assert!(store.load().expect("load empty").is_none());

        let session = sample_session();
        store.save(&session).expect("save");
        let loaded = store.load().expect("load").expect("session present");
        assert_eq!(loaded, session);
        assert_eq!(loaded.user.role(), &Role::Student);
        assert_eq!(store.token().as_deref(), Some("T"));

        store.clear().expect("clear");
        assert!(!store.path().exists());
        assert!(store.load().expect("load cleared").is_none());
    }

    #[test]
    fn test_file_store_layout_uses_two_string_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.save(&sample_session()).expect("save");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).expect("read"))
                .expect("parse");
        assert_eq!(raw[TOKEN_KEY], "T");
        let user_text = raw[USER_KEY].as_str().expect("user stored as string");
        assert!(user_text.contains("valid@x.com"));
    }

    #[test]
    fn test_file_store_ignores_half_written_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), r#"{"token":"T"}"#).expect("write");

        assert!(store.load().expect("load").is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.clear().expect("clear missing file");
    }

    #[test]
    fn test_memory_store_keys_move_together() {
        let store = MemorySessionStore::new();
        assert_eq!(store.has_keys(), (false, false));

        store.save(&sample_session()).expect("save");
        assert_eq!(store.has_keys(), (true, true));

        store.clear().expect("clear");
        assert_eq!(store.has_keys(), (false, false));
        assert!(store.token().is_none());
    }
}
