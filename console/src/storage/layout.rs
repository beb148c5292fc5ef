//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::file::File;

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "FINGERDOOR_HOME";

/// Storage layout for the console
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Persisted operator session
    pub fn session_file(&self) -> File {
        File::new(self.base_dir.join("session.json"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        if let Some(dir) = std::env::var_os(HOME_ENV) {
            return Self::new(dir);
        }

        let base_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fingerdoor");

        Self::new(base_dir)
    }
}
