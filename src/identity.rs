//! Durable session identity.
//!
//! The client keeps exactly one piece of state across restarts: the session
//! identifier under [`SESSION_ID_KEY`]. Storage trouble never stops a chat; it
//! only costs the ability to resume the conversation after a restart.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Key under which the session identifier is persisted.
pub const SESSION_ID_KEY: &str = "chat_session_id";

/// File name used inside the platform data directory.
const STATE_FILE_NAME: &str = "state.json";

/// A durable string key-value slot.
pub trait KeyValueStore: Send + Sync {
    /// Reads `key`, returning `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Returns the persisted session identifier, creating and persisting a new
/// version-4 UUID when none exists.
///
/// A failed read is treated as "not yet generated". A failed write is logged
/// and the fresh identifier is used for this process only.
pub fn get_or_create_session_id(store: &dyn KeyValueStore) -> String {
    match store.get(SESSION_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => return id,
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(error = %err, "could not read session id; generating a new one");
        }
    }

    let id = Uuid::new_v4().to_string();
    match store.set(SESSION_ID_KEY, &id) {
        Ok(()) => tracing::debug!(session_id = %id, "created session id"),
        Err(err) => {
            tracing::warn!(error = %err, session_id = %id, "could not persist session id; it will not survive a restart");
        }
    }
    id
}

/// A JSON file holding a flat object of string values.
///
/// A missing file is an empty store. Writes go to a sibling temporary file
/// that is renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default state file inside the platform data directory.
    pub fn default_location() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ragchat")
            .map(|dirs| dirs.data_dir().join(STATE_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read {}", self.path.display()),
                    err,
                ));
            }
        };
        serde_json::from_slice(&bytes).map_err(|err| {
            Error::serialization(
                format!("failed to parse {}", self.path.display()),
                Some(Box::new(err)),
            )
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                Error::io(format!("failed to create {}", parent.display()), err)
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(values)?;
        fs::write(&tmp, json)
            .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            Error::io(format!("failed to replace {}", self.path.display()), err)
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(err @ Error::Serialization { .. }) => {
                tracing::warn!(error = %err, "discarding unreadable state file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }
}

/// A process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned", Some(key.to_string())))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned", Some(key.to_string())))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
