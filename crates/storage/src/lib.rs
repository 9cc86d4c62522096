use directories::ProjectDirs;
use doc_model::{ModelError, ViewerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SCHEMA_VERSION: u32 = 1;
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported config version {found}")]
    UnsupportedVersion { found: u32 },
    #[error(transparent)]
    Invalid(#[from] ModelError),
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: ViewerConfig,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Flipbook", "Flipbook")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.config_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn load_config(&self) -> Result<ViewerConfig, StorageError> {
        load_config_file(&self.config_path())
    }

    pub fn save_config(&self, config: &ViewerConfig) -> Result<(), StorageError> {
        save_config_file(&self.config_path(), config)
    }
}

/// Write a config envelope to an explicit path, creating parent directories.
pub fn save_config_file(path: &Path, config: &ViewerConfig) -> Result<(), StorageError> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: config.clone() };

    let bytes = serde_json::to_vec_pretty(&envelope)?;
    fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), "saved viewer config");
    Ok(())
}

/// Read a config envelope from an explicit path; a missing file yields defaults.
pub fn load_config_file(path: &Path) -> Result<ViewerConfig, StorageError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ViewerConfig::default());
    }

    let bytes = fs::read(path)?;
    let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;

    if envelope.version != CONFIG_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion { found: envelope.version });
    }

    envelope.config.validate()?;
    Ok(envelope.config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let config = ViewerConfig {
            wheel_debounce_ms: 250,
            thumbnail_animate_distance: 4,
            ..ViewerConfig::default()
        };

        store.save_config(&config).expect("save should succeed");
        let loaded = store.load_config().expect("load should succeed");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_defaults_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let loaded = store.load_config().expect("load should succeed");
        assert_eq!(loaded, ViewerConfig::default());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("partial.json");
        fs::write(&path, r#"{ "version": 1, "config": { "max_zoom": 3.0 } }"#)
            .expect("write should succeed");

        let loaded = load_config_file(&path).expect("load should succeed");
        assert_eq!(loaded.max_zoom, 3.0);
        assert_eq!(loaded.min_zoom, 1.0);
    }

    #[test]
    fn future_version_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("future.json");
        fs::write(&path, r#"{ "version": 2, "config": {} }"#).expect("write should succeed");

        let err = load_config_file(&path).expect_err("load should fail");
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 2 }));
    }

    #[test]
    fn invalid_config_is_not_saved() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = Storage::with_root(temp.path());

        let config = ViewerConfig { min_zoom: 4.0, max_zoom: 2.0, ..ViewerConfig::default() };
        let err = store.save_config(&config).expect_err("save should fail");

        assert!(matches!(err, StorageError::Invalid(_)));
        assert!(!store.config_path().exists());
    }

    #[test]
    fn explicit_path_creates_parent_directories() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("nested/dir/viewer.json");

        save_config_file(&path, &ViewerConfig::default()).expect("save should succeed");

        assert_eq!(load_config_file(&path).expect("load should succeed"), ViewerConfig::default());
    }
}
