use std::{
    fs, io,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use stash_core::StorageConfig;

/// User-level configuration loaded from `~/.config/stash/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Override for the directory holding the store file.
    pub data_dir: Option<PathBuf>,
    /// Store behavior; `storage.directory` wins over `data_dir` when both are set.
    pub storage: StorageConfig,
}

/// Read the user config. Keys missing from the `[storage]` table keep the
/// library's `StorageConfig` defaults, and a missing file means all defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Parse `path` as TOML; an absent or blank file yields `Config::default()`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let contents = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(err.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(toml::from_str(&contents)?)
}

/// `<config dir>/stash/config.toml`, e.g. `~/.config/stash/config.toml` on Linux.
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("stash").join("config.toml"))
}

/// Write the given config to disk unless a file already exists there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_if_missing(config, &default_path()?)
}

fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use stash_core::SerializerSettings;

    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "\n   \n").expect("write blank config");
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            data_dir = "/tmp/stash-data"
            [storage]
            filename = "vault.json"
            enable_encryption = true
            encryption_salt = "pepper"
            auto_persist = false
            [storage.serializer]
            pretty = true
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                data_dir: Some(PathBuf::from("/tmp/stash-data")),
                storage: StorageConfig {
                    filename: "vault.json".into(),
                    enable_encryption: true,
                    encryption_salt: "pepper".into(),
                    auto_persist: false,
                    serializer: SerializerSettings { pretty: true },
                    ..StorageConfig::default()
                },
            }
        );
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/stash-data")),
            storage: StorageConfig::default(),
        };

        write_if_missing(&cfg, &path).expect("write should succeed");
        fs::write(&path, "data_dir = \"/elsewhere\"\n").expect("user edit");
        let second = write_if_missing(&cfg, &path).expect("second write ok");

        assert_eq!(second, path);
        let loaded = load_from_path(&path).expect("load");
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/elsewhere")));
    }

    #[test]
    fn written_config_parses_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/stash-data")),
            storage: StorageConfig {
                read_only: true,
                ..StorageConfig::default()
            },
        };

        write_if_missing(&cfg, &path).expect("write");
        assert_eq!(load_from_path(&path).expect("load"), cfg);
    }
}
