//! Hub configuration, read from `~/.testhub/config.yaml`.
//!
//! Every field has a default, and a missing file is equivalent to an empty
//! one. Loading never writes; [`save_at`] is the only writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::paths::{config_path, default_data_dir, home};

/// Tunables for the reconciliation engine and its file-backed stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Pause between generation calls in bulk generation.
    pub generate_delay_ms: u64,
    /// Pause between items in a library sync.
    pub sync_delay_ms: u64,
    /// Records requested per entity from the generation adapter.
    pub records_per_entity: usize,
    /// Maximum retained entries in a test artifact's version history.
    pub history_limit: usize,
    /// Override for the collection directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            generate_delay_ms: 1000,
            sync_delay_ms: 50,
            records_per_entity: 3,
            history_limit: 10,
            data_dir: None,
        }
    }
}

impl HubConfig {
    pub fn generate_delay(&self) -> Duration {
        Duration::from_millis(self.generate_delay_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    /// Directory holding the collection files, rooted at `home` unless overridden.
    pub fn data_dir_at(&self, home: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| default_data_dir(home))
    }
}

/// Load `<home>/.testhub/config.yaml`, falling back to defaults when absent.
pub fn load_at(home: &Path) -> Result<HubConfig, StoreError> {
    let path = config_path(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HubConfig::default())
        }
        Err(err) => return Err(io_err(&path, err)),
    };
    if contents.trim().is_empty() {
        return Ok(HubConfig::default());
    }
    let config: HubConfig = serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
        path: path.clone(),
        source: e,
    })?;
    if config.history_limit == 0 {
        return Err(StoreError::InvalidConfig {
            path,
            reason: "history_limit must be at least 1".to_string(),
        });
    }
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<HubConfig, StoreError> {
    load_at(&home()?)
}

/// Atomically write `<home>/.testhub/config.yaml`.
pub fn save_at(home: &Path, config: &HubConfig) -> Result<(), StoreError> {
    let path = config_path(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let home = TempDir::new().unwrap();
        let cfg = load_at(home.path()).unwrap();
        assert_eq!(cfg, HubConfig::default());
        assert_eq!(cfg.generate_delay(), Duration::from_secs(1));
        assert_eq!(cfg.sync_delay(), Duration::from_millis(50));
        assert_eq!(cfg.records_per_entity, 3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let home = TempDir::new().unwrap();
        let path = config_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "generate_delay_ms: 0\nhistory_limit: 2\n").unwrap();

        let cfg = load_at(home.path()).unwrap();
        assert_eq!(cfg.generate_delay_ms, 0);
        assert_eq!(cfg.history_limit, 2);
        assert_eq!(cfg.sync_delay_ms, 50);
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let home = TempDir::new().unwrap();
        let path = config_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "history_limit: 0\n").unwrap();

        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("history_limit"));
    }

    #[test]
    fn data_dir_defaults_under_home() {
        let home = TempDir::new().unwrap();
        let cfg = HubConfig::default();
        assert_eq!(cfg.data_dir_at(home.path()), default_data_dir(home.path()));

        let custom = HubConfig {
            data_dir: Some(PathBuf::from("/srv/testhub")),
            ..HubConfig::default()
        };
        assert_eq!(custom.data_dir_at(home.path()), PathBuf::from("/srv/testhub"));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let cfg = HubConfig {
            generate_delay_ms: 5,
            ..HubConfig::default()
        };
        save_at(home.path(), &cfg).unwrap();
        assert_eq!(load_at(home.path()).unwrap(), cfg);
    }

    #[test]
    fn malformed_file_reports_path() {
        let home = TempDir::new().unwrap();
        let path = config_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "generate_delay_ms: [not a number").unwrap();
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }
}
