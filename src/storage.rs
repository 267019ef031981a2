//! Persistence mirror for the workout list
//!
//! Records are stored as a JSON array of plain objects including their derived
//! fields. Loading deserializes them as-is; nothing is recomputed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::models::WorkoutRecord;

/// Key-value style storage for the serialized workout list
pub trait Persistence {
    /// Replace the stored workouts with `records`
    fn save(&mut self, records: &[WorkoutRecord]) -> Result<(), PersistenceError>;

    /// Stored workouts, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<Vec<WorkoutRecord>>, PersistenceError>;
}

/// Serialize workouts to the stored JSON form
pub fn serialize_records(records: &[WorkoutRecord]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(records)?)
}

/// Parse the stored JSON form; `null` means nothing stored
pub fn deserialize_records(data: &str) -> Result<Option<Vec<WorkoutRecord>>, PersistenceError> {
    serde_json::from_str::<Option<Vec<WorkoutRecord>>>(data).map_err(|e| {
        PersistenceError::Corrupted {
            reason: e.to_string(),
        }
    })
}

/// Workouts mirrored into a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFileStorage {
    fn save(&mut self, records: &[WorkoutRecord]) -> Result<(), PersistenceError> {
        let json = serialize_records(records)?;

        let write_failed = |e: std::io::Error| PersistenceError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_failed)?;
            }
        }
        fs::write(&self.path, json).map_err(write_failed)?;

        debug!(path = %self.path.display(), count = records.len(), "Saved workouts");
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<WorkoutRecord>>, PersistenceError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No stored workouts yet");
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path).map_err(|e| PersistenceError::ReadFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        deserialize_records(&data)
    }
}

/// In-memory storage holding the serialized string, like a browser key
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Option<String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a raw serialized value
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            fail_writes: false,
        }
    }

    /// Storage that rejects every write, as when the quota is exhausted
    pub fn failing() -> Self {
        Self {
            data: None,
            fail_writes: true,
        }
    }

    /// Raw stored value
    pub fn raw(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl Persistence for MemoryStorage {
    fn save(&mut self, records: &[WorkoutRecord]) -> Result<(), PersistenceError> {
        if self.fail_writes {
            return Err(PersistenceError::WriteFailed {
                path: PathBuf::from("memory"),
                reason: "storage quota exceeded".to_string(),
            });
        }
        self.data = Some(serialize_records(records)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<WorkoutRecord>>, PersistenceError> {
        match &self.data {
            Some(data) => deserialize_records(data),
            None => Ok(None),
        }
    }
}
