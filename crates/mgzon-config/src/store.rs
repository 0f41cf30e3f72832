//! Filesystem access for the configuration record.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{ConfigError, ConfigResult};
use crate::model::CliConfig;

/// Directory under the home directory holding all CLI state.
pub(crate) const CONFIG_DIR: &str = ".mgzon";
/// File name of the configuration record inside [`CONFIG_DIR`].
pub(crate) const CONFIG_FILE: &str = "config.json";

/// Handle to the on-disk configuration record.
///
/// Commands construct one per invocation; there is no caching and no lock,
/// matching the last-writer-wins contract of the file itself.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `<home>/.mgzon/config.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] when the home directory cannot be
    /// resolved.
    pub fn default_location() -> ConfigResult<Self> {
        let dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::at_path(
            dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE),
        ))
    }

    /// Store at an explicit path. Used by tests and the `MGZON_CONFIG_PATH`
    /// override.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, returning defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> ConfigResult<CliConfig> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "config file absent, using defaults");
                return Ok(CliConfig::default());
            }
            Err(err) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            source: err,
        })
    }

    /// Persist `config` shallow-merged over the existing file contents.
    ///
    /// Fields left `None` in `config` keep their stored values; everything
    /// set here overwrites. The whole file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error when the existing file is unreadable or the write
    /// fails.
    pub fn save(&self, config: CliConfig) -> ConfigResult<CliConfig> {
        let merged = config.merged_over(self.load()?);
        self.replace(&merged)?;
        Ok(merged)
    }

    /// Persist `config` wholesale, discarding the previous file contents.
    ///
    /// Used where cleared fields must stay cleared (`logout`, `config clear`).
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the write
    /// fails.
    pub fn replace(&self, config: &CliConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| ConfigError::Io {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
        let raw = serde_json::to_string_pretty(config).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            source: err,
        })?;
        fs::write(&self.path, raw).map_err(|err| ConfigError::Io {
            path: self.path.clone(),
            source: err,
        })?;
        tracing::debug!(path = %self.path.display(), "config file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::at_path(dir.path().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let config = store.load().expect("load");
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn save_merges_with_existing_contents() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .save(CliConfig {
                api_key: Some("first-key".to_string()),
                theme: Some("dark".to_string()),
                ..CliConfig::default()
            })
            .expect("initial save");

        let merged = store
            .save(CliConfig {
                api_key: Some("second-key".to_string()),
                ..CliConfig::default()
            })
            .expect("merging save");

        assert_eq!(merged.api_key.as_deref(), Some("second-key"));
        assert_eq!(merged.theme.as_deref(), Some("dark"));

        let reloaded = store.load().expect("reload");
        assert_eq!(reloaded, merged);
    }

    #[test]
    fn replace_discards_cleared_fields() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .save(CliConfig {
                api_key: Some("key".to_string()),
                email: Some("dev@example.com".to_string()),
                theme: Some("dark".to_string()),
                ..CliConfig::default()
            })
            .expect("save");

        let mut cleared = store.load().expect("load");
        cleared.clear_credentials();
        store.replace(&cleared).expect("replace");

        let reloaded = store.load().expect("reload");
        assert!(reloaded.api_key.is_none());
        assert!(reloaded.email.is_none());
        assert_eq!(reloaded.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn load_surfaces_parse_errors() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        fs::write(store.path(), "not json").expect("write");

        let err = store.load().expect_err("malformed file must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
