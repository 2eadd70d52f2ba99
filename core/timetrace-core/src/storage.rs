//! Storage path management for timetrace.
//!
//! All on-disk locations derive from one root directory: the database file
//! and `config.json` live side by side.
//!
//! Resolution order for the database:
//! 1. an explicit `--db PATH`
//! 2. the `TIMETRACE_DB` environment variable
//! 3. `<OS data dir>/timetrace/timetrace.db`

use std::path::{Path, PathBuf};

use crate::error::{Result, TraceError};

pub const APP_DIR_NAME: &str = "timetrace";
pub const DB_FILE_NAME: &str = "timetrace.db";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DB_ENV_VAR: &str = "TIMETRACE_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    root: PathBuf,
    db_path: PathBuf,
}

impl StorageConfig {
    /// Resolves paths from an optional explicit database path, then the
    /// environment, then the per-user data directory.
    pub fn resolve(explicit_db: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_db {
            return Ok(Self::with_db_path(path.to_path_buf()));
        }
        if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(Self::with_db_path(PathBuf::from(path)));
        }
        let data_dir = dirs::data_dir().ok_or(TraceError::DataDirNotFound)?;
        Ok(Self::with_root(data_dir.join(APP_DIR_NAME)))
    }

    /// Uses `root` for everything. Tests inject temp directories here.
    pub fn with_root(root: PathBuf) -> Self {
        let db_path = root.join(DB_FILE_NAME);
        Self { root, db_path }
    }

    /// Uses `db_path` as the database; the config sits in the same directory.
    pub fn with_db_path(db_path: PathBuf) -> Self {
        let root = db_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { root, db_path }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_root_places_files_under_root() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/tt"));
        assert_eq!(config.db_path(), Path::new("/tmp/tt/timetrace.db"));
        assert_eq!(config.config_file(), PathBuf::from("/tmp/tt/config.json"));
    }

    #[test]
    fn explicit_db_path_wins() {
        let config = StorageConfig::resolve(Some(Path::new("/data/work.db"))).unwrap();
        assert_eq!(config.db_path(), Path::new("/data/work.db"));
        assert_eq!(config.root(), Path::new("/data"));
        assert_eq!(config.config_file(), PathBuf::from("/data/config.json"));
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        let config = StorageConfig::with_db_path(PathBuf::from("local.db"));
        assert_eq!(config.root(), Path::new("."));
    }
}
