//! Window navigator: cursor state machine over the log window service.
//!
//! One navigator owns one viewer's state. Each action issues at most one
//! bounded fetch; a second action started while a fetch is outstanding is a
//! no-op, never queued. State changes only when a fetch succeeds, and then
//! all at once, so a failed request leaves the previous window and the
//! newer-cursor stack exactly as they were.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::LogServiceError;
use crate::event::{NavEvent, NavEventKind, NavEventOutcome, NavEventSink, NullNavEventSink};
use crate::group::group_by_run;
use crate::normalize::rendered_events;
use crate::service::LogWindowService;
use crate::types::{FileList, LogFile, WindowChunk, WindowMeta, WindowRequest};
use crate::view::{empty_state, AuditSnapshot};

/// Lines requested per window and the most a window ever keeps.
pub const PAGE_SIZE: usize = 50;

/// Why an action did not issue a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    NoOlder,
    NoNewer,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InFlight => "fetch already in flight",
            Self::NoOlder => "no older window",
            Self::NoNewer => "no newer window",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded,
    Skipped(SkipReason),
}

/// Everything the navigator owns. Only navigator methods write it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub files: Vec<LogFile>,
    pub selected_file: String,
    /// `to` cursors of windows left by `load_older`, most recent last.
    pub newer_stack: Vec<u64>,
    pub meta: WindowMeta,
    pub lines: Vec<String>,
    /// Display-only message from the last failed fetch.
    pub error: Option<String>,
}

/// How a successful window fetch updates the cursor stack.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    /// Latest window of `file`; pagination history is dropped.
    Reset { file: String },
    /// Moved back in time from a window that ended at `previous_to`.
    Older { previous_to: u64 },
    /// Returned to the window on top of the stack.
    Newer,
}

impl NavState {
    fn apply_window(&mut self, chunk: WindowChunk, transition: Transition) {
        let (meta, mut lines) = chunk.into_parts();
        if lines.len() > PAGE_SIZE {
            lines.drain(..lines.len() - PAGE_SIZE);
        }
        match transition {
            Transition::Reset { file } => {
                self.selected_file = file;
                self.newer_stack.clear();
            }
            Transition::Older { previous_to } => self.newer_stack.push(previous_to),
            Transition::Newer => {
                self.newer_stack.pop();
            }
        }
        self.meta = meta;
        self.lines = lines;
        self.error = None;
    }

    fn apply_files(&mut self, list: FileList) {
        self.selected_file = pick_selection(&self.selected_file, &list);
        self.files = list.items;
    }
}

/// Keeps the current selection if still listed, then the service default,
/// then the first file. With nothing listed the default name is used as-is.
fn pick_selection(current: &str, list: &FileList) -> String {
    let preferred = list.default_file.trim();
    if list.items.is_empty() {
        return preferred.to_string();
    }
    if !current.is_empty() && list.contains(current) {
        return current.to_string();
    }
    if !preferred.is_empty() && list.contains(preferred) {
        return preferred.to_string();
    }
    list.items
        .first()
        .map(|item| item.name.clone())
        .unwrap_or_default()
}

/// Clears the in-flight flag when the fetch finishes or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct WindowNavigator {
    service: Arc<dyn LogWindowService>,
    sink: Arc<dyn NavEventSink>,
    state: Mutex<NavState>,
    in_flight: AtomicBool,
}

impl WindowNavigator {
    pub fn new(service: Arc<dyn LogWindowService>) -> Self {
        Self {
            service,
            sink: Arc::new(NullNavEventSink),
            state: Mutex::new(NavState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn NavEventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn state(&self) -> NavState {
        self.lock_state().clone()
    }

    pub fn meta(&self) -> WindowMeta {
        self.lock_state().meta.clone()
    }

    pub fn newer_stack(&self) -> Vec<u64> {
        self.lock_state().newer_stack.clone()
    }

    pub fn selected_file(&self) -> String {
        self.lock_state().selected_file.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    /// Builds the renderer's view: events newest first, grouped by run.
    pub fn snapshot(&self) -> AuditSnapshot {
        let loading = self.is_loading();
        let state = self.lock_state();
        let events = rendered_events(&state.lines);
        let groups = group_by_run(&events);
        AuditSnapshot {
            files: state.files.clone(),
            selected_file: state.selected_file.clone(),
            meta: state.meta.clone(),
            empty_state: empty_state(&state.meta, &groups, loading),
            groups,
            can_go_newer: !state.newer_stack.is_empty(),
            can_go_older: state.meta.has_older,
            loading,
            error: state.error.clone(),
        }
    }

    /// Loads the file list and then the newest window of the selected file.
    /// A file-list failure is kept as the display error; the window load still
    /// runs and its result is returned.
    pub async fn init(&self) -> Result<FetchOutcome, LogServiceError> {
        if let Err(err) = self.load_files().await {
            debug!(error = %err, "continuing with previous file selection");
        }
        let file = self.selected_file();
        self.load_latest(&file).await
    }

    pub async fn load_files(&self) -> Result<FetchOutcome, LogServiceError> {
        let Some(_guard) = self.try_begin() else {
            self.emit(NavEventKind::ListFiles, "", None, skipped(SkipReason::InFlight));
            return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
        };

        match self.service.list_files().await {
            Ok(list) => {
                let count = list.items.len();
                let mut state = self.lock_state();
                state.apply_files(list);
                debug!(files = count, selected = %state.selected_file, "audit file list loaded");
                let selected = state.selected_file.clone();
                drop(state);
                self.emit(NavEventKind::ListFiles, selected, None, NavEventOutcome::Loaded);
                Ok(FetchOutcome::Loaded)
            }
            Err(err) => {
                warn!(retryable = err.is_retryable(), error = %err, "audit file list failed");
                self.lock_state().error = Some(err.to_string());
                self.emit(
                    NavEventKind::ListFiles,
                    "",
                    None,
                    NavEventOutcome::Failed(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Newest window of `file`; clears the newer-cursor stack on success.
    pub async fn load_latest(&self, file: &str) -> Result<FetchOutcome, LogServiceError> {
        let Some(_guard) = self.try_begin() else {
            self.emit(NavEventKind::Latest, file, None, skipped(SkipReason::InFlight));
            return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
        };
        let request = WindowRequest::latest(file, PAGE_SIZE);
        self.fetch(
            NavEventKind::Latest,
            request,
            Transition::Reset {
                file: file.to_string(),
            },
        )
        .await
    }

    /// Reloads the newest window of the current selection.
    pub async fn refresh_latest(&self) -> Result<FetchOutcome, LogServiceError> {
        let file = self.selected_file();
        self.load_latest(&file).await
    }

    /// Selects another file and shows its newest window.
    pub async fn switch_file(&self, file: &str) -> Result<FetchOutcome, LogServiceError> {
        self.load_latest(file).await
    }

    /// Window ending where the current one starts.
    pub async fn load_older(&self) -> Result<FetchOutcome, LogServiceError> {
        let Some(_guard) = self.try_begin() else {
            self.emit(NavEventKind::Older, "", None, skipped(SkipReason::InFlight));
            return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
        };
        let (file, from, to, has_older) = {
            let state = self.lock_state();
            (
                state.selected_file.clone(),
                state.meta.from,
                state.meta.to,
                state.meta.has_older,
            )
        };
        if !has_older {
            self.emit(NavEventKind::Older, file, None, skipped(SkipReason::NoOlder));
            return Ok(FetchOutcome::Skipped(SkipReason::NoOlder));
        }
        let request = WindowRequest::ending_at(file, from, PAGE_SIZE);
        self.fetch(
            NavEventKind::Older,
            request,
            Transition::Older { previous_to: to },
        )
        .await
    }

    /// Returns to the window most recently left by `load_older`.
    pub async fn load_newer(&self) -> Result<FetchOutcome, LogServiceError> {
        let Some(_guard) = self.try_begin() else {
            self.emit(NavEventKind::Newer, "", None, skipped(SkipReason::InFlight));
            return Ok(FetchOutcome::Skipped(SkipReason::InFlight));
        };
        let (file, top) = {
            let state = self.lock_state();
            (state.selected_file.clone(), state.newer_stack.last().copied())
        };
        let Some(cursor) = top else {
            self.emit(NavEventKind::Newer, file, None, skipped(SkipReason::NoNewer));
            return Ok(FetchOutcome::Skipped(SkipReason::NoNewer));
        };
        let request = WindowRequest::ending_at(file, cursor, PAGE_SIZE);
        self.fetch(NavEventKind::Newer, request, Transition::Newer).await
    }

    /// Callers must hold the in-flight guard.
    async fn fetch(
        &self,
        kind: NavEventKind,
        request: WindowRequest,
        transition: Transition,
    ) -> Result<FetchOutcome, LogServiceError> {
        let file = request.file.clone();
        let cursor = request.anchor();
        self.lock_state().error = None;
        debug!(action = %kind, file = %file, cursor = ?cursor, limit = request.limit, "fetching audit window");

        match self.service.get_window(request).await {
            Ok(chunk) => {
                let (from, to, lines) = (chunk.from, chunk.to, chunk.lines.len());
                self.lock_state().apply_window(chunk, transition);
                info!(action = %kind, file = %file, from, to, lines, "audit window loaded");
                self.emit(kind, file, cursor, NavEventOutcome::Loaded);
                Ok(FetchOutcome::Loaded)
            }
            Err(err) => {
                warn!(
                    action = %kind,
                    file = %file,
                    cursor = ?cursor,
                    retryable = err.is_retryable(),
                    error = %err,
                    "audit window fetch failed"
                );
                self.lock_state().error = Some(err.to_string());
                self.emit(kind, file, cursor, NavEventOutcome::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    fn lock_state(&self) -> MutexGuard<'_, NavState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(
        &self,
        kind: NavEventKind,
        file: impl Into<String>,
        cursor: Option<u64>,
        outcome: NavEventOutcome,
    ) {
        if let NavEventOutcome::Skipped(reason) = &outcome {
            debug!(action = %kind, reason = %reason, "navigation skipped");
        }
        self.sink.record(NavEvent::new(kind, file, cursor, outcome));
    }
}

fn skipped(reason: SkipReason) -> NavEventOutcome {
    NavEventOutcome::Skipped(reason.to_string())
}
