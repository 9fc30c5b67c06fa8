//! Run journal: the append-only, line-oriented log of one sync pass.
//!
//! The journal is an explicit value handed to the sync driver. Each entry is
//! also forwarded to the `log` facade so `RUST_LOG` shows it on stderr.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

pub trait Journal {
    fn record(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&mut self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&mut self, message: &str) {
        self.record(Level::Error, message);
    }
}

fn forward(level: Level, message: &str) {
    match level {
        Level::Info => log::info!("{message}"),
        Level::Warn => log::warn!("{message}"),
        Level::Error => log::error!("{message}"),
    }
}

/// `<local time> - <LEVEL> - <message>` lines appended to a file.
pub struct FileJournal {
    file: File,
}

impl FileJournal {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SyncError::io(path, e))?;
        Ok(Self { file })
    }
}

impl Journal for FileJournal {
    fn record(&mut self, level: Level, message: &str) {
        forward(level, message);
        let line = format!(
            "{} - {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level.as_str(),
            message
        );
        // A journal write failure must not stop the sync.
        if let Err(e) = self.file.write_all(line.as_bytes()) {
            log::error!("cannot write run journal: {e}");
        }
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    pub entries: Vec<(Level, String)>,
}

impl MemoryJournal {
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, m)| m.as_str()).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|(_, m)| m.contains(needle))
    }
}

impl Journal for MemoryJournal {
    fn record(&mut self, level: Level, message: &str) {
        forward(level, message);
        self.entries.push((level, message.to_string()));
    }
}
