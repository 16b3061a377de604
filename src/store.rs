//! Persisted view state
//!
//! The table remembers page, page size and currency between sessions. Values
//! are kept as three independent string entries in a [`StateStorage`]
//! backend, so one bad entry never invalidates the others.

use crate::{
    constants::{CURRENCY_KEY, PAGE_KEY, ROWS_PER_PAGE_KEY, STATE_DIR_NAME, STATE_FILE_NAME},
    error::StateError,
    types::{Currency, Page, RowsPerPage, ViewField, ViewState},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// String-keyed storage backing the view state
pub trait StateStorage: Send + Sync {
    /// Reads one entry, `Ok(None)` when it was never written
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Writes one entry
    fn set(&self, key: &str, value: &str) -> Result<(), StateError>;
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage kept as a flat JSON object in a file
///
/// The file is read once when opened. A missing or corrupt file starts out
/// empty; every write rewrites the whole file. Writes use blocking
/// `std::fs` calls on the caller's thread: the file holds three short
/// entries and is written only when the view state changes.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Opens the storage at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable view state file"
                );
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Default location under the platform data directory
    ///
    /// Falls back to the working directory when the platform has none.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(STATE_DIR_NAME)
            .join(STATE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<HashMap<String, String>, StateError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let json = std::fs::read_to_string(path)?;
        let entries = serde_json::from_str(&json)?;
        Ok(entries)
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl StateStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StateError::Unavailable(e.to_string()))?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.write_entries(&entries) {
            // keep memory in step with what is on disk
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Loads and saves the table's [`ViewState`]
///
/// Neither operation fails: invalid entries fall back to their defaults and
/// write errors are logged. The storage is a convenience cache, not a
/// source of truth.
#[derive(Clone)]
pub struct ViewStateStore {
    storage: Arc<dyn StateStorage>,
}

impl ViewStateStore {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Reads the persisted view state
    ///
    /// Each field is parsed on its own; a missing or malformed field takes
    /// its default while the other two keep their persisted values.
    pub fn load(&self) -> ViewState {
        let view = ViewState {
            page: self.load_field::<Page>(PAGE_KEY),
            rows_per_page: self.load_field::<RowsPerPage>(ROWS_PER_PAGE_KEY),
            currency: self.load_field::<Currency>(CURRENCY_KEY),
        };
        tracing::debug!(view = %view, "Loaded view state");
        view
    }

    /// Persists one field
    pub fn save(&self, field: ViewField) {
        let key = Self::key(&field);
        let value = field.value();

        match self.storage.set(key, &value) {
            Ok(()) => tracing::debug!(field = field.name(), value = %value, "Saved view state field"),
            Err(e) => tracing::warn!(
                field = field.name(),
                error = %e,
                "Failed to persist view state field"
            ),
        }
    }

    /// Persists all three fields
    pub fn save_all(&self, view: &ViewState) {
        self.save(ViewField::Page(view.page));
        self.save(ViewField::RowsPerPage(view.rows_per_page));
        self.save(ViewField::Currency(view.currency));
    }

    fn key(field: &ViewField) -> &'static str {
        match field {
            ViewField::Page(_) => PAGE_KEY,
            ViewField::RowsPerPage(_) => ROWS_PER_PAGE_KEY,
            ViewField::Currency(_) => CURRENCY_KEY,
        }
    }

    fn load_field<T>(&self, key: &str) -> T
    where
        T: FromStr<Err = StateError> + Default,
    {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read view state field");
                return T::default();
            }
        };

        raw.parse::<T>().unwrap_or_else(|e| {
            tracing::debug!(key, error = %e, "Falling back to default");
            T::default()
        })
    }
}
