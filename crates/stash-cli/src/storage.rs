use std::path::PathBuf;

use crate::config::Config;
use color_eyre::Result;
use dirs::data_dir;
use stash_core::StorageConfig;
use stash_storage::LocalStorage;
use tracing::debug;

/// Resolve the default data directory for Stash.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("stash"))
}

/// Storage settings from user config, with the directory filled in and CLI flags applied.
pub fn storage_config(config: &Config, read_only: bool) -> Result<StorageConfig> {
    let mut storage = config.storage.clone();
    if storage.directory.is_none() {
        storage.directory = Some(match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        });
    }
    storage.read_only |= read_only;
    Ok(storage)
}

/// Open the store described by `storage`.
pub fn open(storage: StorageConfig, password: Option<&str>) -> Result<LocalStorage> {
    debug!(directory = ?storage.directory, filename = %storage.filename, "opening local storage");
    Ok(LocalStorage::with_password(
        storage,
        password.unwrap_or_default(),
    )?)
}

/// Helper for tests: a store rooted at `root` that never writes on drop.
#[cfg(test)]
pub fn test_storage(root: impl Into<PathBuf>) -> LocalStorage {
    LocalStorage::new(StorageConfig {
        auto_persist: false,
        ..StorageConfig::in_directory(root)
    })
    .expect("test storage should open")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_override_becomes_directory() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/stash-data")),
            storage: StorageConfig::default(),
        };
        let storage = storage_config(&cfg, false).expect("storage config");
        assert_eq!(storage.directory, Some(PathBuf::from("/tmp/stash-data")));
        assert!(!storage.read_only);
    }

    #[test]
    fn explicit_directory_wins_and_flag_forces_read_only() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/ignored")),
            storage: StorageConfig::in_directory("/tmp/explicit"),
        };
        let storage = storage_config(&cfg, true).expect("storage config");
        assert_eq!(storage.directory, Some(PathBuf::from("/tmp/explicit")));
        assert!(storage.read_only);
    }

    #[test]
    fn open_requires_password_for_encrypted_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            enable_encryption: true,
            ..StorageConfig::in_directory(dir.path())
        };
        assert!(open(storage, None).is_err());
    }
}
