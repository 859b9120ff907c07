#![allow(clippy::expect_used, clippy::unwrap_used)]

//! File-backed service tests, including full navigation over a real log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use morph_audit::error::LogServiceError;
use morph_audit::local::LocalAuditLogService;
use morph_audit::navigator::{FetchOutcome, SkipReason, WindowNavigator};
use morph_audit::service::LogWindowService;
use morph_audit::types::WindowRequest;

fn write_log(dir: &Path, name: &str, count: usize) -> Vec<String> {
    let lines: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"event_id":"e{i}","run_id":"r{}","decision":"allow"}}"#, i / 3))
        .collect();
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(dir.join(name), body).unwrap();
    lines
}

#[tokio::test]
async fn tail_window_returns_newest_lines() {
    let dir = tempfile::tempdir().unwrap();
    let lines = write_log(dir.path(), "audit.jsonl", 120);
    let svc = LocalAuditLogService::new(dir.path().join("audit.jsonl"));

    let chunk = svc
        .get_window(WindowRequest::latest("audit.jsonl", 50))
        .await
        .unwrap();
    assert!(chunk.exists);
    assert_eq!(chunk.lines.len(), 50);
    assert_eq!(chunk.lines, lines[70..].to_vec());
    assert_eq!(chunk.to, chunk.size_bytes);
    assert_eq!(chunk.before, chunk.from);
    assert!(chunk.from < chunk.to);
    assert!(chunk.has_older);
}

#[tokio::test]
async fn windows_tile_the_file_without_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let lines = write_log(dir.path(), "audit.jsonl", 75);
    let svc = LocalAuditLogService::new(dir.path().join("audit.jsonl"));

    let newest = svc
        .get_window(WindowRequest::latest("", 30))
        .await
        .unwrap();
    let middle = svc
        .get_window(WindowRequest::ending_at("", newest.from, 30))
        .await
        .unwrap();
    let oldest = svc
        .get_window(WindowRequest::ending_at("", middle.from, 30))
        .await
        .unwrap();

    assert_eq!(middle.to, newest.from);
    assert_eq!(oldest.to, middle.from);
    assert_eq!(oldest.from, 0);
    assert!(!oldest.has_older);

    let mut all = oldest.lines.clone();
    all.extend(middle.lines.clone());
    all.extend(newest.lines.clone());
    assert_eq!(all, lines);
}

#[tokio::test]
async fn rejects_names_outside_the_family() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "audit.jsonl", 1);
    fs::write(dir.path().join("secrets.txt"), "nope\n").unwrap();
    let svc = LocalAuditLogService::new(dir.path().join("audit.jsonl"));

    for name in ["secrets.txt", "../audit.jsonl", "sub/audit.jsonl"] {
        let err = svc
            .get_window(WindowRequest::latest(name, 10))
            .await
            .unwrap_err();
        assert!(
            matches!(err, LogServiceError::InvalidArgument { .. }),
            "{name}: {err}"
        );
    }
}

#[tokio::test]
async fn rotated_files_are_listed_and_readable() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "audit.jsonl", 2);
    let rotated = write_log(dir.path(), "audit.jsonl.1", 4);
    let svc = LocalAuditLogService::new(dir.path().join("audit.jsonl"));

    let list = svc.list_files().await.unwrap();
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.items[0].name, "audit.jsonl");
    assert!(list.contains("audit.jsonl.1"));

    let chunk = svc
        .get_window(WindowRequest::latest("audit.jsonl.1", 50))
        .await
        .unwrap();
    assert_eq!(chunk.lines, rotated);
    assert_eq!(chunk.file, "audit.jsonl.1");
}

#[tokio::test]
async fn navigator_pages_through_a_real_log() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "audit.jsonl", 120);
    let svc = Arc::new(LocalAuditLogService::new(dir.path().join("audit.jsonl")));
    let nav = WindowNavigator::new(svc);

    assert_eq!(nav.init().await.unwrap(), FetchOutcome::Loaded);
    assert_eq!(nav.selected_file(), "audit.jsonl");
    let latest = nav.meta();

    nav.load_older().await.unwrap();
    nav.load_older().await.unwrap();
    assert_eq!(nav.meta().from, 0);
    assert_eq!(nav.state().lines.len(), 20);
    assert_eq!(
        nav.load_older().await.unwrap(),
        FetchOutcome::Skipped(SkipReason::NoOlder)
    );
    assert_eq!(nav.newer_stack().len(), 2);

    nav.load_newer().await.unwrap();
    nav.load_newer().await.unwrap();
    assert_eq!(nav.meta(), latest);
    assert!(nav.newer_stack().is_empty());
}

#[tokio::test]
async fn line_finished_after_tail_load_keeps_newer_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let lines = write_log(dir.path(), "audit.jsonl", 60);
    let complete = fs::metadata(&path).unwrap().len();
    OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap()
        .write_all(br#"{"event_id":"e60","run_"#)
        .unwrap();

    let nav = WindowNavigator::new(Arc::new(LocalAuditLogService::new(path.clone())));
    nav.init().await.unwrap();
    let tail = nav.meta();
    assert_eq!(tail.to, complete);
    assert_eq!(nav.state().lines.last(), lines.last());

    OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap()
        .write_all(b"id\":\"r20\",\"decision\":\"deny\"}\n")
        .unwrap();

    nav.load_older().await.unwrap();
    assert_eq!(nav.newer_stack(), vec![complete]);
    nav.load_newer().await.unwrap();
    assert_eq!(nav.meta().to, tail.to);
    assert_eq!(nav.meta().from, tail.from);
    assert_eq!(nav.state().lines.last(), lines.last());
    assert!(nav.newer_stack().is_empty());

    nav.refresh_latest().await.unwrap();
    let newest = nav.state().lines.last().cloned().unwrap();
    assert_eq!(newest, r#"{"event_id":"e60","run_id":"r20","decision":"deny"}"#);
}

#[tokio::test]
async fn missing_log_renders_as_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let svc = Arc::new(LocalAuditLogService::new(dir.path().join("audit.jsonl")));
    let nav = WindowNavigator::new(svc);

    nav.init().await.unwrap();
    let snapshot = nav.snapshot();
    assert!(snapshot.files.is_empty());
    assert!(!snapshot.meta.exists);
    assert_eq!(
        snapshot.empty_state,
        Some(morph_audit::view::EmptyState::NoFile)
    );
}
