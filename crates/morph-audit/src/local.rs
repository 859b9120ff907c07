//! File-backed log window service.
//!
//! Serves windows of the guard's audit log straight from disk. A window is
//! located by byte offsets: `to` is where it ends, `from` where its oldest line
//! starts. Windows are read backwards in fixed-size chunks starting at the
//! cursor, so paging through a large log never scans the whole file.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use morph_core::config::{ConsoleConfig, DEFAULT_AUDIT_FILE};
use tracing::debug;

use crate::error::LogServiceError;
use crate::navigator::PAGE_SIZE;
use crate::service::LogWindowService;
use crate::types::{FileList, LogFile, WindowChunk, WindowRequest};

const READ_CHUNK: usize = 64 * 1024;
const DEFAULT_LIMIT: usize = PAGE_SIZE;
const MAX_LIMIT: usize = 500;

/// Serves the base audit file and its rotated siblings (`<base>.*`) from one
/// directory.
#[derive(Debug, Clone)]
pub struct LocalAuditLogService {
    dir: PathBuf,
    base_file: String,
}

impl LocalAuditLogService {
    /// `audit_path` is the live audit file; its directory is the listing root.
    pub fn new(audit_path: impl Into<PathBuf>) -> Self {
        let audit_path = audit_path.into();
        let base_file = audit_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_AUDIT_FILE)
            .to_string();
        let dir = match audit_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { dir, base_file }
    }

    pub fn from_config(cfg: &ConsoleConfig) -> Self {
        Self::new(cfg.audit_path())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_file(&self) -> &str {
        &self.base_file
    }

    fn in_family(&self, name: &str) -> bool {
        name == self.base_file
            || name
                .strip_prefix(self.base_file.as_str())
                .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'))
    }

    /// Maps a requested file name to a path inside the audit directory.
    fn resolve(&self, requested: &str) -> Result<(String, PathBuf), LogServiceError> {
        let name = requested.trim();
        if name.is_empty() {
            return Ok((self.base_file.clone(), self.dir.join(&self.base_file)));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(LogServiceError::InvalidArgument {
                message: format!("invalid file name {name:?}"),
            });
        }
        if !self.in_family(name) {
            return Err(LogServiceError::InvalidArgument {
                message: format!("{name:?} is not part of the {} log family", self.base_file),
            });
        }
        Ok((name.to_string(), self.dir.join(name)))
    }

    fn list_blocking(&self) -> Result<FileList, LogServiceError> {
        let mut list = FileList {
            items: Vec::new(),
            default_file: self.base_file.clone(),
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(list),
            Err(err) => return Err(err.into()),
        };

        let mut found: Vec<(Option<SystemTime>, LogFile)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.in_family(&name) {
                continue;
            }
            let path = entry.path();
            let meta = fs::metadata(&path)?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().ok();
            found.push((
                modified,
                LogFile {
                    current: name == self.base_file,
                    name,
                    path: path.display().to_string(),
                    size_bytes: meta.len(),
                    mod_time: modified.map(format_mod_time).unwrap_or_default(),
                },
            ));
        }

        found.sort_by(|(a_time, a), (b_time, b)| {
            b.current
                .cmp(&a.current)
                .then_with(|| b_time.cmp(a_time))
                .then_with(|| b.name.cmp(&a.name))
        });
        list.items = found.into_iter().map(|(_, file)| file).collect();
        Ok(list)
    }

    fn window_blocking(&self, request: &WindowRequest) -> Result<WindowChunk, LogServiceError> {
        let (name, path) = self.resolve(&request.file)?;
        let limit = clamp_limit(request.limit);
        let display_path = path.display().to_string();

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(WindowChunk {
                    file: name,
                    path: display_path,
                    exists: false,
                    ..WindowChunk::default()
                });
            }
            Err(err) => return Err(err.into()),
        };
        if !meta.is_file() {
            return Err(LogServiceError::InvalidArgument {
                message: format!("{name:?} is not a regular file"),
            });
        }

        let size = meta.len();
        let end = request.anchor().map_or(size, |cursor| cursor.min(size));
        let scan = scan_window(File::open(&path)?, size, end, limit, READ_CHUNK)?;
        Ok(WindowChunk {
            file: name,
            path: display_path,
            exists: true,
            size_bytes: size,
            before: scan.from,
            from: scan.from,
            to: scan.to,
            has_older: scan.has_older,
            lines: scan.lines,
        })
    }
}

#[async_trait]
impl LogWindowService for LocalAuditLogService {
    async fn list_files(&self) -> Result<FileList, LogServiceError> {
        let service = self.clone();
        let list = tokio::task::spawn_blocking(move || service.list_blocking())
            .await
            .map_err(|err| LogServiceError::Unavailable {
                message: format!("list task failed: {err}"),
            })??;
        debug!(dir = %self.dir.display(), files = list.items.len(), "listed audit files");
        Ok(list)
    }

    async fn get_window(&self, request: WindowRequest) -> Result<WindowChunk, LogServiceError> {
        let service = self.clone();
        let chunk = tokio::task::spawn_blocking(move || service.window_blocking(&request))
            .await
            .map_err(|err| LogServiceError::Unavailable {
                message: format!("window task failed: {err}"),
            })??;
        debug!(
            file = %chunk.file,
            exists = chunk.exists,
            from = chunk.from,
            to = chunk.to,
            lines = chunk.lines.len(),
            "read audit window"
        );
        Ok(chunk)
    }
}

fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

fn format_mod_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct WindowScan {
    from: u64,
    to: u64,
    has_older: bool,
    lines: Vec<String>,
}

/// Collects up to `limit` non-blank lines ending at `end`, oldest first.
/// A cursor inside a line moves back to that line's start. A line still being
/// written at the end of the file is left out until its `\n` lands, so `to`
/// is always a line boundary.
fn scan_window<R: Read + Seek>(
    reader: R,
    size: u64,
    end: u64,
    limit: usize,
    chunk: usize,
) -> io::Result<WindowScan> {
    let mut lines = ReverseLineReader::new(reader, end, chunk);
    let mut to = end.min(size);
    if let Some((start, _partial)) = lines.next_line()? {
        to = start;
    }

    let mut scan = WindowScan {
        from: to,
        to,
        ..WindowScan::default()
    };
    while scan.lines.len() < limit {
        let Some((start, bytes)) = lines.next_line()? else {
            break;
        };
        if is_blank(&bytes) {
            continue;
        }
        scan.from = start;
        scan.lines.push(line_text(&bytes));
    }
    while let Some((_, bytes)) = lines.next_line()? {
        if !is_blank(&bytes) {
            scan.has_older = true;
            break;
        }
    }
    scan.lines.reverse();
    Ok(scan)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn line_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Yields `\n`-separated lines from `end` towards the start of the input.
struct ReverseLineReader<R> {
    inner: R,
    /// Offset of `pending[0]`.
    pos: u64,
    /// Bytes read but not yet split into lines.
    pending: Vec<u8>,
    chunk: usize,
    done: bool,
}

impl<R: Read + Seek> ReverseLineReader<R> {
    fn new(inner: R, end: u64, chunk: usize) -> Self {
        Self {
            inner,
            pos: end,
            pending: Vec::new(),
            chunk: chunk.max(1),
            done: false,
        }
    }

    /// Next line (without its terminator) and the offset of its first byte.
    fn next_line(&mut self) -> io::Result<Option<(u64, Vec<u8>)>> {
        loop {
            if self.done {
                return Ok(None);
            }
            if let Some(idx) = self.pending.iter().rposition(|b| *b == b'\n') {
                let line = self.pending.split_off(idx + 1);
                self.pending.truncate(idx);
                return Ok(Some((self.pos + idx as u64 + 1, line)));
            }
            if self.pos == 0 {
                self.done = true;
                return Ok(Some((0, std::mem::take(&mut self.pending))));
            }

            let step = usize::try_from(self.pos).map_or(self.chunk, |pos| pos.min(self.chunk));
            self.pos -= step as u64;
            self.inner.seek(SeekFrom::Start(self.pos))?;
            let mut buf = vec![0; step];
            self.inner.read_exact(&mut buf)?;
            buf.extend_from_slice(&self.pending);
            self.pending = buf;
        }
    }
}
