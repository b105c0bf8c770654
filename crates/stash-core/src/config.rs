use std::{
    env, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Default name of the backing file.
pub const DEFAULT_FILENAME: &str = ".localstorage";
/// Default salt fed to key derivation when encryption is enabled.
pub const DEFAULT_ENCRYPTION_SALT: &str = ".localstorage";

/// Behavioral switches for a storage instance. Missing fields take their defaults
/// when deserialized, so partial TOML/JSON configs are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Load previously persisted state when the instance is opened.
    pub auto_unpersist: bool,
    /// Persist the latest state once when the instance is torn down.
    pub auto_persist: bool,
    /// Encrypt every stored value with a password-derived key.
    pub enable_encryption: bool,
    pub encryption_salt: String,
    /// Name of the backing file.
    pub filename: String,
    /// Refuse `store` and `persist` while enabled.
    pub read_only: bool,
    /// Directory holding the backing file; defaults to the directory of the running executable.
    pub directory: Option<PathBuf>,
    pub serializer: SerializerSettings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            auto_unpersist: true,
            auto_persist: true,
            enable_encryption: false,
            encryption_salt: DEFAULT_ENCRYPTION_SALT.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            read_only: false,
            directory: None,
            serializer: SerializerSettings::default(),
        }
    }
}

/// Settings handed to the codec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerSettings {
    /// Emit indented output instead of compact output.
    pub pretty: bool,
}

impl StorageConfig {
    /// Convenience for a config rooted at an explicit directory.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Reject configurations no instance could work with.
    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(StorageError::Config {
                reason: "filename must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Full path of the backing file.
    pub fn resolve_path(&self) -> io::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.join(&self.filename)),
            None => Ok(executable_dir()?.join(&self.filename)),
        }
    }
}

fn executable_dir() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no parent directory for executable {}", exe.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = StorageConfig::default();
        assert!(cfg.auto_unpersist);
        assert!(cfg.auto_persist);
        assert!(!cfg.enable_encryption);
        assert!(!cfg.read_only);
        assert_eq!(cfg.encryption_salt, ".localstorage");
        assert_eq!(cfg.filename, ".localstorage");
        assert_eq!(cfg.directory, None);
        assert!(!cfg.serializer.pretty);
    }

    #[test]
    fn resolves_against_configured_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = StorageConfig {
            filename: "data.json".into(),
            ..StorageConfig::in_directory(dir.path())
        };
        assert_eq!(
            cfg.resolve_path().expect("path"),
            dir.path().join("data.json")
        );
    }

    #[test]
    fn resolves_next_to_executable_by_default() {
        let cfg = StorageConfig::default();
        let path = cfg.resolve_path().expect("path");
        let exe = env::current_exe().expect("current exe");
        assert_eq!(path.parent(), exe.parent());
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(DEFAULT_FILENAME)
        );
    }

    #[test]
    fn rejects_blank_filename() {
        let cfg = StorageConfig {
            filename: "  ".into(),
            ..StorageConfig::default()
        };
        let err = cfg.validate().expect_err("blank filename should be rejected");
        assert!(matches!(err, StorageError::Config { .. }));
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let cfg: StorageConfig =
            serde_json::from_str(r#"{ "read_only": true, "serializer": {} }"#).expect("parse");
        assert!(cfg.read_only);
        assert!(cfg.auto_persist);
        assert_eq!(cfg.filename, DEFAULT_FILENAME);
    }
}
