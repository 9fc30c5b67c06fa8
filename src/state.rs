//! Sync state: the watermark persisted between runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    last_timestamp: u64,
}

/// What [`StateStore::load_outcome`] found on disk.
#[derive(Debug, PartialEq, Eq)]
pub enum StateLoad {
    Absent,
    Corrupt(String),
    Loaded(u64),
}

impl StateLoad {
    /// Absent and corrupt state both start from 0.
    pub fn watermark(&self) -> u64 {
        match self {
            StateLoad::Loaded(v) => *v,
            StateLoad::Absent | StateLoad::Corrupt(_) => 0,
        }
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> u64 {
        self.load_outcome().watermark()
    }

    pub fn load_outcome(&self) -> StateLoad {
        match self.read() {
            Ok(Some(v)) => StateLoad::Loaded(v),
            Ok(None) => StateLoad::Absent,
            Err(e) => StateLoad::Corrupt(e.to_string()),
        }
    }

    fn read(&self) -> Result<Option<u64>> {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.corrupt(e)),
        };
        if s.trim().is_empty() {
            return Err(self.corrupt("file is empty"));
        }
        let state: StateFile = serde_json::from_str(&s).map_err(|e| self.corrupt(e))?;
        Ok(Some(state.last_timestamp))
    }

    fn corrupt(&self, reason: impl ToString) -> SyncError {
        SyncError::StateCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Replace the stored watermark. Written to a temporary file beside the
    /// destination and renamed over it, so readers see the old or new value.
    pub fn save(&self, last_timestamp: u64) -> Result<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| SyncError::io(&dir, e))?;

        let data = serde_json::to_vec(&StateFile { last_timestamp })
            .map_err(|e| SyncError::io(&self.path, std::io::Error::other(e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| SyncError::io(&dir, e))?;
        tmp.write_all(&data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| SyncError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| SyncError::io(&self.path, e.error))?;
        Ok(())
    }
}
