//! Log window service trait: the only way the viewer reaches the audit log.
//!
//! Implementations can read a local file tree or sit in front of a remote
//! runtime API; the navigator does not care which.

use async_trait::async_trait;

use crate::error::LogServiceError;
use crate::types::{FileList, WindowChunk, WindowRequest};

#[async_trait]
pub trait LogWindowService: Send + Sync {
    /// Enumerates the selectable audit files and the service's default.
    async fn list_files(&self) -> Result<FileList, LogServiceError>;

    /// Returns at most `request.limit` lines ending at `request.cursor`, or
    /// the newest lines when no cursor is given. Lines are oldest first.
    async fn get_window(&self, request: WindowRequest) -> Result<WindowChunk, LogServiceError>;
}
