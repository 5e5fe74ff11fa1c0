use crate::error::PersistenceError;
use crate::journal_entry::JournalEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::HashMap,
    fs, io,
    path::PathBuf,
    rc::Rc,
};

/// Key under which the key-value fallback keeps the entry list.
pub const ENTRIES_KEY: &str = "quran-journal-entries";

/// Durable home of the journal. Every write carries the full collection.
pub trait Persistence {
    /// Reads every stored entry. An absent resource is an empty journal,
    /// not an error.
    fn read_all(&self) -> Result<Vec<JournalEntry>, PersistenceError>;

    fn write_all(&mut self, snapshot: &JournalSnapshot<'_>) -> Result<(), PersistenceError>;

    fn describe(&self) -> String;
}

/// Outgoing record, borrowed from the store's staged collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSnapshot<'a> {
    pub entries: &'a [JournalEntry],
    pub last_updated: DateTime<Utc>,
}

/// Incoming record. `lastUpdated` is informational and may be absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDocument {
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }
}

impl Persistence for FileBackend {
    fn read_all(&self) -> Result<Vec<JournalEntry>, PersistenceError> {
        let serialized = match fs::read_to_string(&self.path) {
            Ok(serialized) => serialized,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let document: JournalDocument = serde_json::from_str(&serialized)?;
        Ok(document.entries)
    }

    fn write_all(&mut self, snapshot: &JournalSnapshot<'_>) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let serialized = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// String key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), PersistenceError>;
}

/// Process-local key-value store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.items.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Fallback backend: keeps the bare entry array as JSON under [`ENTRIES_KEY`].
pub struct KeyValueBackend<S> {
    store: S,
}

impl<S: KeyValueStore> KeyValueBackend<S> {
    pub fn new(store: S) -> Self {
        KeyValueBackend { store }
    }
}

impl<S: KeyValueStore> Persistence for KeyValueBackend<S> {
    fn read_all(&self) -> Result<Vec<JournalEntry>, PersistenceError> {
        match self.store.get(ENTRIES_KEY) {
            Some(serialized) => Ok(serde_json::from_str(&serialized)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&mut self, snapshot: &JournalSnapshot<'_>) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_string(snapshot.entries)?;
        self.store.set(ENTRIES_KEY, serialized)
    }

    fn describe(&self) -> String {
        format!("key-value store ({ENTRIES_KEY})")
    }
}
