//! Extension-local key/value storage
//!
//! State that must survive restarts (the pause flag, the profile collection and
//! the selected profile) is written through the [`LocalStorage`] trait. The
//! file backend keeps every key in a single JSON document guarded by a lock
//! file, so concurrent writers are serialized per file.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::StorageError;

/// Key holding the pause flag (`true` = paused)
pub const IS_PAUSED_KEY: &str = "isPaused";
/// Key holding the ordered profile collection
pub const PROFILES_KEY: &str = "profiles";
/// Key holding the selected profile id
pub const SELECTED_PROFILE_KEY: &str = "selectedProfileId";

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Key/value store with the semantics of the browser's extension-local storage
pub trait LocalStorage: Send + Sync {
    /// Reads the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Writes `value` under `key`; returns only after the write is complete
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

impl<T: LocalStorage + ?Sized> LocalStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Reads and deserializes the value under `key`
pub fn read_key<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Serializes and writes `value` under `key`
pub fn write_key<T: Serialize + ?Sized>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value).map_err(|e| StorageError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    storage.set(key, value)
}

/// Stores all keys in one JSON file with file locking
pub struct FileStorage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl FileStorage {
    /// Creates a new FileStorage for the given file; the file is created on first write
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("json.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Acquire an exclusive lock for writing; the returned handle holds the lock
    fn acquire_write_lock(&self) -> Result<File, StorageError> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .map_err(|e| self.io_error(&self.lock_file_path, e))?;

        self.wait_for_lock(|| FileExt::try_lock_exclusive(&lock_file))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if a lock file exists yet
    fn acquire_read_lock(&self) -> Result<Option<File>, StorageError> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .map_err(|e| self.io_error(&self.lock_file_path, e))?;

        self.wait_for_lock(|| FileExt::try_lock_shared(&lock_file))?;
        Ok(Some(lock_file))
    }

    fn wait_for_lock<F>(&self, mut try_lock: F) -> Result<(), StorageError>
    where
        F: FnMut() -> std::io::Result<()>,
    {
        let start = Instant::now();
        loop {
            match try_lock() {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        return Err(StorageError::FileLocked(self.file_path.clone()));
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(self.io_error(&self.lock_file_path, e)),
            }
        }
    }

    /// Reads the whole document; a missing file is an empty document
    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.file_path.exists() {
            return Ok(Map::new());
        }

        let file = File::open(&self.file_path).map_err(|e| self.io_error(&self.file_path, e))?;
        let value: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| StorageError::Parse {
                path: self.file_path.clone(),
                message: e.to_string(),
            })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Parse {
                path: self.file_path.clone(),
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(document).map_err(|e| StorageError::Parse {
            path: self.file_path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.file_path, json).map_err(|e| self.io_error(&self.file_path, e))
    }

    /// Reload, apply `update_fn`, and save while holding the write lock
    fn update_atomically<F>(&self, update_fn: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut lock_file = self.acquire_write_lock()?;

        // Lock holder info, for debugging only
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let mut document = self.read_document()?;
        update_fn(&mut document);
        self.write_document(&document)
        // Lock is released when lock_file is dropped
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _lock = self.acquire_read_lock()?;
        let mut document = self.read_document()?;
        Ok(document.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        log::debug!("storage set {} in {:?}", key, self.file_path);
        self.update_atomically(|document| {
            document.insert(key.to_string(), value);
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// In-process storage, used by tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<Map<String, Value>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail, simulating an unavailable backend
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        let failing = self.fail_writes.lock().map(|flag| *flag).unwrap_or(true);
        if failing {
            return Err(StorageError::Unavailable("writes are disabled".to_string()));
        }
        Ok(())
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, Map<String, Value>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("storage mutex poisoned".to_string()))
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.check_writable()?;
        self.values()?.insert(key.to_string(), value);
        Ok(())
    }

}
