//! Wire-level types exchanged with the log window service.

use serde::{Deserialize, Serialize};

/// One selectable audit log (the live file or a rotated sibling).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFile {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    /// RFC3339 modification time, empty when unknown.
    pub mod_time: String,
    /// True for the file the guard is currently appending to.
    pub current: bool,
}

/// Result of `list_files`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileList {
    pub items: Vec<LogFile>,
    pub default_file: String,
}

impl FileList {
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }
}

/// Parameters for one window fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    /// File name as listed by the service; empty selects its default file.
    pub file: String,
    /// Byte offset the window ends at. `None` or negative selects the tail.
    pub cursor: Option<i64>,
    pub limit: usize,
}

impl WindowRequest {
    pub fn latest(file: impl Into<String>, limit: usize) -> Self {
        Self {
            file: file.into(),
            cursor: None,
            limit,
        }
    }

    pub fn ending_at(file: impl Into<String>, cursor: u64, limit: usize) -> Self {
        Self {
            file: file.into(),
            cursor: Some(i64::try_from(cursor).unwrap_or(i64::MAX)),
            limit,
        }
    }

    /// The cursor as a byte offset, or `None` when the tail is requested.
    pub fn anchor(&self) -> Option<u64> {
        self.cursor.and_then(|cursor| u64::try_from(cursor).ok())
    }
}

/// Position and extent of the currently loaded window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowMeta {
    pub path: String,
    pub exists: bool,
    pub size_bytes: u64,
    /// Offset immediately preceding the window.
    pub before: u64,
    pub from: u64,
    pub to: u64,
    pub has_older: bool,
}

/// Result of `get_window`: metadata plus raw lines, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowChunk {
    pub file: String,
    pub path: String,
    pub exists: bool,
    pub size_bytes: u64,
    pub before: u64,
    pub from: u64,
    pub to: u64,
    pub has_older: bool,
    pub lines: Vec<String>,
}

impl WindowChunk {
    pub fn meta(&self) -> WindowMeta {
        WindowMeta {
            path: self.path.clone(),
            exists: self.exists,
            size_bytes: self.size_bytes,
            before: self.before,
            from: self.from,
            to: self.to,
            has_older: self.has_older,
        }
    }

    pub fn into_parts(self) -> (WindowMeta, Vec<String>) {
        let meta = self.meta();
        (meta, self.lines)
    }
}
