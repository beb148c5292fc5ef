//! JSON files on local storage

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::DashboardError;

/// A file reference by path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Read and decode the file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, DashboardError> {
        let contents = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Encode as pretty JSON and replace the file atomically
    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), DashboardError> {
        self.write_atomic(&serde_json::to_vec_pretty(value)?, None).await
    }

    /// Like [`File::write_json`], but the file is owner read/write (0o600)
    /// from creation on. The mode is ignored off Unix.
    pub async fn write_private_json<T: Serialize>(&self, value: &T) -> Result<(), DashboardError> {
        self.write_atomic(&serde_json::to_vec_pretty(value)?, Some(0o600))
            .await
    }

    async fn write_atomic(&self, contents: &[u8], mode: Option<u32>) -> Result<(), DashboardError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // a leftover temp file would keep its old mode
        let temp = File::new(self.path.with_extension("tmp"));
        temp.delete().await?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            if let Some(mode) = mode {
                options.mode(mode);
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(temp.path()).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(temp.path(), &self.path).await?;
        Ok(())
    }

    /// Remove the file if present
    pub async fn delete(&self) -> Result<(), DashboardError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
