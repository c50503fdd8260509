//! Durable visited-set storage
//!
//! The state file is a plain JSON array of user ID strings. Reading never
//! fails the run: a missing or corrupt file is treated as an empty set.

use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::types::VisitedSet;

/// Load/save access to the visited set
pub trait VisitedStore: Send + Sync {
    /// Read the stored set, falling back to an empty set on any problem
    fn load(&self) -> VisitedSet;

    /// Overwrite the stored set with `set`
    fn save(&self, set: &VisitedSet) -> Result<(), StateError>;
}

/// Visited set persisted to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> StateError {
        StateError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl VisitedStore for JsonFileStore {
    fn load(&self) -> VisitedSet {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No state file at {}, starting empty", self.path.display());
                return VisitedSet::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read state file {}: {}; starting empty",
                    self.path.display(),
                    e
                );
                return VisitedSet::new();
            }
        };

        match serde_json::from_str::<VisitedSet>(&content) {
            Ok(set) => {
                tracing::debug!("Loaded {} processed user(s) from state", set.len());
                set
            }
            Err(e) => {
                tracing::warn!(
                    "State file {} is not a JSON array of IDs ({}); starting empty",
                    self.path.display(),
                    e
                );
                VisitedSet::new()
            }
        }
    }

    fn save(&self, set: &VisitedSet) -> Result<(), StateError> {
        let json = serde_json::to_string(set)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        // Write-then-rename: readers never see a partially written array
        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| self.write_error(e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            self.write_error(e)
        })?;

        Ok(())
    }
}
