//! Small persisted key/value preferences.
//!
//! Values are strings, stored as a flat JSON object in
//! `~/.config/focusguard/preferences.json`. The only preference the
//! permission subsystem needs is the "don't show the permission modal again"
//! flag, wrapped by [`SuppressionPreference`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{CoreError, PreferenceError};
use crate::storage::data_dir;

/// Key of the remediation-modal suppression flag.
pub const SUPPRESS_PERMISSION_MODAL_KEY: &str = "focusguard_dont_show_permission_modal";

/// Backing storage for preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept in a JSON file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `preferences.json` in the data directory.
    pub fn open_default() -> Result<Self, CoreError> {
        Ok(Self::at(data_dir()?.join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.read_failed(e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| self.read_failed(e))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;
        }
        let content = serde_json::to_string_pretty(values).map_err(|e| self.write_failed(e))?;
        std::fs::write(&self.path, content).map_err(|e| self.write_failed(e))
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        apply(&mut values);
        self.write_all(&values)
    }

    fn read_failed(&self, e: impl std::fmt::Display) -> PreferenceError {
        PreferenceError::ReadFailed {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }

    fn write_failed(&self, e: impl std::fmt::Display) -> PreferenceError {
        PreferenceError::WriteFailed {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}

/// Preferences that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// The persisted "don't show the permission modal again" choice.
///
/// Reads and writes are best effort: an unreadable store counts as "not
/// suppressed" and a failed write as "not recorded".
#[derive(Clone)]
pub struct SuppressionPreference {
    store: Arc<dyn PreferenceStore>,
}

impl SuppressionPreference {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn try_is_set(&self) -> Result<bool, PreferenceError> {
        Ok(self.store.get(SUPPRESS_PERMISSION_MODAL_KEY)?.as_deref() == Some("true"))
    }

    pub fn is_set(&self) -> bool {
        self.try_is_set().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read modal suppression flag; treating as not set");
            false
        })
    }

    pub fn try_set(&self) -> Result<(), PreferenceError> {
        self.store.set(SUPPRESS_PERMISSION_MODAL_KEY, "true")
    }

    /// Returns whether the flag was recorded.
    pub fn set(&self) -> bool {
        match self.try_set() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not record modal suppression flag");
                false
            }
        }
    }

    /// Manual reset; nothing in the app clears the flag on its own.
    pub fn clear(&self) -> Result<(), PreferenceError> {
        self.store.remove(SUPPRESS_PERMISSION_MODAL_KEY)
    }
}

impl std::fmt::Debug for SuppressionPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuppressionPreference").finish_non_exhaustive()
    }
}
