//! Mock log window service for unit testing.
//!
//! Records every call and answers from pre-configured windows keyed by file
//! and cursor. An optional gate holds `get_window` open so tests can exercise
//! overlapping navigation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::LogServiceError;
use crate::service::LogWindowService;
use crate::types::{FileList, LogFile, WindowChunk, WindowRequest};

/// A recorded call to the mock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListFiles,
    GetWindow(WindowRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    file: String,
    cursor: Option<u64>,
}

/// Mock implementation of `LogWindowService` for testing.
pub struct MockLogWindowService {
    files: Mutex<FileList>,
    windows: Mutex<HashMap<WindowKey, WindowChunk>>,
    calls: Mutex<Vec<MockCall>>,
    list_error: Mutex<Option<LogServiceError>>,
    window_error: Mutex<Option<LogServiceError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for MockLogWindowService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLogWindowService {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(FileList::default()),
            windows: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            window_error: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }

    /// Configure the `list_files` answer.
    pub fn with_files(self, files: FileList) -> Self {
        *lock(&self.files) = files;
        self
    }

    /// Serve `chunk` for `file` at `cursor` (`None` = newest window).
    pub fn with_window(self, file: &str, cursor: Option<u64>, chunk: WindowChunk) -> Self {
        self.set_window(file, cursor, chunk);
        self
    }

    /// Serve `chunk` for any file at `cursor`.
    pub fn with_any_file_window(self, cursor: Option<u64>, chunk: WindowChunk) -> Self {
        self.set_window("", cursor, chunk);
        self
    }

    /// Replace a scripted window after construction.
    pub fn set_window(&self, file: &str, cursor: Option<u64>, chunk: WindowChunk) {
        lock(&self.windows).insert(
            WindowKey {
                file: file.to_string(),
                cursor,
            },
            chunk,
        );
    }

    /// Configure the next `list_files` call to fail.
    pub fn with_list_error(self, err: LogServiceError) -> Self {
        *lock(&self.list_error) = Some(err);
        self
    }

    /// Configure the next `get_window` call to fail.
    pub fn fail_next_window(&self, err: LogServiceError) {
        *lock(&self.window_error) = Some(err);
    }

    /// Hold every `get_window` call until the gate is notified.
    pub fn with_gate(self, gate: Arc<Notify>) -> Self {
        *lock(&self.gate) = Some(gate);
        self
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Return the number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Return only the window requests, in call order.
    pub fn window_requests(&self) -> Vec<WindowRequest> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                MockCall::GetWindow(request) => Some(request.clone()),
                MockCall::ListFiles => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    fn lookup(&self, request: &WindowRequest) -> Option<WindowChunk> {
        let windows = lock(&self.windows);
        let cursor = request.anchor();
        windows
            .get(&WindowKey {
                file: request.file.clone(),
                cursor,
            })
            .or_else(|| {
                windows.get(&WindowKey {
                    file: String::new(),
                    cursor,
                })
            })
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Helper to create a log file entry with sensible defaults.
pub fn test_file(name: &str, size_bytes: u64) -> LogFile {
    LogFile {
        name: name.to_string(),
        path: format!("/state/guard/audit/{name}"),
        size_bytes,
        mod_time: "2026-01-01T00:00:00Z".to_string(),
        current: !name.contains(".jsonl."),
    }
}

/// Helper to create an existing-file window with the given extent.
pub fn test_chunk(file: &str, from: u64, to: u64, has_older: bool, lines: &[&str]) -> WindowChunk {
    WindowChunk {
        file: file.to_string(),
        path: format!("/state/guard/audit/{file}"),
        exists: true,
        size_bytes: to.max(1000),
        before: from,
        from,
        to,
        has_older,
        lines: lines.iter().map(|line| (*line).to_string()).collect(),
    }
}

#[async_trait]
impl LogWindowService for MockLogWindowService {
    async fn list_files(&self) -> Result<FileList, LogServiceError> {
        self.record(MockCall::ListFiles);

        if let Some(err) = lock(&self.list_error).take() {
            return Err(err);
        }
        Ok(lock(&self.files).clone())
    }

    async fn get_window(&self, request: WindowRequest) -> Result<WindowChunk, LogServiceError> {
        self.record(MockCall::GetWindow(request.clone()));

        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = lock(&self.window_error).take() {
            return Err(err);
        }

        self.lookup(&request)
            .ok_or_else(|| LogServiceError::Unavailable {
                message: format!(
                    "no scripted window for file {:?} at cursor {:?}",
                    request.file, request.cursor
                ),
            })
    }
}
