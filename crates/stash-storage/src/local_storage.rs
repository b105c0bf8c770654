use std::{
    borrow::Cow,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{de::DeserializeOwned, Serialize};
use stash_core::{
    Codec, JsonCodec, ReadOnlyOperation, Result, StorageConfig, StorageError, Store,
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use crate::cipher::TextCipher;

/// In-memory key/value store that is written to, and read from, a single file.
///
/// Values are encoded with the codec (JSON by default) and, when encryption is
/// enabled, encrypted before they enter the in-memory map. `persist` writes the
/// whole map; `unpersist` replaces the whole map with the file's contents.
///
/// Dropping the instance persists once when `auto_persist` is set. Use
/// [`LocalStorage::close`] to observe failures of that final write.
pub struct LocalStorage<C: Codec = JsonCodec> {
    config: StorageConfig,
    path: PathBuf,
    codec: C,
    cipher: Option<TextCipher>,
    store: Store,
    // Guards the backing file for this instance only.
    file_lock: Mutex<()>,
    closed: bool,
}

impl LocalStorage<JsonCodec> {
    /// Open with an optional configuration; a missing configuration is rejected.
    /// `password` is only required when encryption is enabled.
    pub fn open(config: Option<StorageConfig>, password: &str) -> Result<Self> {
        let config = config.ok_or_else(|| StorageError::Config {
            reason: "a configuration is required".to_string(),
        })?;
        let codec = JsonCodec::new(&config.serializer);
        Self::open_with_codec(config, password, codec)
    }

    pub fn new(config: StorageConfig) -> Result<Self> {
        Self::open(Some(config), "")
    }

    pub fn with_password(config: StorageConfig, password: &str) -> Result<Self> {
        Self::open(Some(config), password)
    }

    /// Default configuration: `.localstorage` next to the running executable.
    pub fn with_defaults() -> Result<Self> {
        Self::new(StorageConfig::default())
    }
}

impl<C: Codec> LocalStorage<C> {
    pub fn open_with_codec(config: StorageConfig, password: &str, codec: C) -> Result<Self> {
        config.validate()?;

        let cipher = if config.enable_encryption {
            if password.is_empty() {
                return Err(StorageError::Config {
                    reason: "a password is required when encryption is enabled".to_string(),
                });
            }
            Some(TextCipher::new(password, &config.encryption_salt))
        } else {
            None
        };

        let path = config.resolve_path()?;
        let mut storage = Self {
            config,
            path,
            codec,
            cipher,
            store: Store::new(),
            file_lock: Mutex::new(()),
            closed: false,
        };

        if storage.config.auto_unpersist {
            if let Err(err) = storage.unpersist() {
                // A half-opened instance must not overwrite the file on drop.
                storage.closed = true;
                return Err(err);
            }
        }

        debug!(
            path = %storage.path.display(),
            entries = storage.store.len(),
            "opened local storage"
        );
        Ok(storage)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// Encode (and encrypt) `value`, replacing any existing entry for `key`.
    #[instrument(skip(self, value))]
    pub fn store<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        if key.is_empty() {
            return Err(StorageError::Validation {
                reason: "key must not be empty".to_string(),
            });
        }
        if self.config.read_only {
            return Err(StorageError::ReadOnly {
                operation: ReadOnlyOperation::Store,
            });
        }

        let encoded = self
            .codec
            .encode(value)
            .map_err(|e| StorageError::Serialization {
                reason: e.to_string(),
            })?;
        if self.codec.is_absent(&encoded) {
            return Err(StorageError::Validation {
                reason: format!("value for key '{key}' must not be null"),
            });
        }

        let text = match &self.cipher {
            Some(cipher) => cipher.encrypt(&encoded)?,
            None => encoded,
        };
        self.store.set(key, text);
        Ok(())
    }

    /// Decode the value stored under `key` into `T`.
    #[instrument(skip(self))]
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let raw = self.store.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;

        let text = match &self.cipher {
            Some(cipher) => Cow::Owned(cipher.decrypt(raw)?),
            None => Cow::Borrowed(raw),
        };

        self.codec
            .decode(&text)
            .map_err(|e| StorageError::Deserialization {
                target: format!("key '{key}'"),
                reason: e.to_string(),
            })
    }

    /// Load without knowing the stored type ahead of time.
    pub fn load_untyped(&self, key: &str) -> Result<serde_json::Value> {
        self.load(key)
    }

    /// Load the collection stored under `key`.
    pub fn query<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        self.load(key)
    }

    /// Load the collection stored under `key`, keeping only items matching `predicate`.
    pub fn query_where<T, P>(&self, key: &str, predicate: P) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: FnMut(&T) -> bool,
    {
        let mut items: Vec<T> = self.load(key)?;
        items.retain(predicate);
        Ok(items)
    }

    /// Remove `key` if present.
    pub fn remove(&mut self, key: &str) {
        self.store.remove(key);
    }

    /// Empty the in-memory store; the backing file is left as is.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Write the entire store to the backing file, replacing its contents.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn persist(&self) -> Result<()> {
        if self.config.read_only {
            return Err(StorageError::ReadOnly {
                operation: ReadOnlyOperation::Persist,
            });
        }

        let document = self
            .codec
            .encode(&self.store)
            .map_err(|e| StorageError::Serialization {
                reason: e.to_string(),
            })?;

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.file_lock.lock().unwrap_or_else(PoisonError::into_inner);
        write_document(&self.path, &document)?;
        debug!(entries = self.store.len(), "persisted store");
        Ok(())
    }

    /// Replace the in-memory store with the backing file's contents.
    /// A missing or blank file leaves memory untouched.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn unpersist(&mut self) -> Result<()> {
        let Some(contents) = self.read_document()? else {
            debug!("no persisted state to load");
            return Ok(());
        };

        let store: Store = self
            .codec
            .decode(&contents)
            .map_err(|e| StorageError::Deserialization {
                target: format!("store file {}", self.path.display()),
                reason: e.to_string(),
            })?;

        debug!(entries = store.len(), "loaded persisted store");
        self.store = store;
        Ok(())
    }

    /// Delete the backing file if it exists; memory is left as is.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn destroy(&self) -> Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("deleted backing file");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Tear down, running the auto-persist (if configured) and reporting its result.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.config.auto_persist && !self.config.read_only {
            self.persist()?;
        }
        Ok(())
    }

    fn read_document(&self) -> Result<Option<String>> {
        let _guard = self.file_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl<C: Codec> Drop for LocalStorage<C> {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(path = %self.path.display(), "auto-persist failed: {err}");
        }
    }
}

impl<C: Codec> std::fmt::Debug for LocalStorage<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("path", &self.path)
            .field("entries", &self.store.len())
            .field("encrypted", &self.cipher.is_some())
            .field("read_only", &self.config.read_only)
            .finish_non_exhaustive()
    }
}

// Write to a sibling temp file, then rename it over the target.
fn write_document(path: &Path, document: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid storage path"))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(document.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
