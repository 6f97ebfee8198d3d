//! Filesystem layout under `~/.testhub/`.
//!
//! ```text
//! ~/.testhub/
//!   config.yaml
//!   data/
//!     templates.yaml
//!     working_copies.yaml
//!     test_artifacts.yaml
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub const CONFIG_FILE: &str = "config.yaml";

pub fn testhub_root(home: &Path) -> PathBuf {
    home.join(".testhub")
}

pub fn config_path(home: &Path) -> PathBuf {
    testhub_root(home).join(CONFIG_FILE)
}

pub fn default_data_dir(home: &Path) -> PathBuf {
    testhub_root(home).join("data")
}

/// `<data_dir>/<collection>.yaml`. Pure, no I/O.
pub fn collection_path(data_dir: &Path, collection: &str) -> PathBuf {
    data_dir.join(format!("{collection}.yaml"))
}

pub fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_dot_testhub() {
        let home = Path::new("/home/dev");
        assert!(config_path(home).ends_with(".testhub/config.yaml"));
        assert!(default_data_dir(home).ends_with(".testhub/data"));
        assert!(collection_path(&default_data_dir(home), "templates")
            .ends_with(".testhub/data/templates.yaml"));
    }
}
