//! The shared command file
//!
//! Producers append whole lines; the single consumer takes everything at
//! once and truncates before any line is processed. A write landing between
//! the read and the truncate is lost.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::BusError;

#[derive(Debug, Clone)]
pub struct CommandInbox {
    path: PathBuf,
}

impl CommandInbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file (and its directory) if it is missing; never truncates
    pub fn ensure_exists(&self) -> Result<(), BusError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| BusError::file_access(parent, "create", e))?;
            }
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| BusError::file_access(&self.path, "create", e))?;
        Ok(())
    }

    /// Read the whole file and empty it.
    ///
    /// Returns `None` when there is nothing but whitespace; the file is left
    /// untouched in that case. Invalid UTF-8 is replaced rather than
    /// rejected so one bad write cannot wedge the inbox.
    pub async fn take(&self) -> Result<Option<String>, BusError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "command file vanished, recreating");
                self.ensure_exists()?;
                return Ok(None);
            }
            Err(e) => return Err(BusError::file_access(&self.path, "read", e)),
        };

        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Ok(None);
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| BusError::file_access(&self.path, "truncate", e))?;
        file.set_len(0)
            .await
            .map_err(|e| BusError::file_access(&self.path, "truncate", e))?;

        Ok(Some(text))
    }
}
