//! Read-only view model handed to the presentation layer.
//!
//! Everything here is plain data: renderers consume `AuditSnapshot` and the
//! `GroupView`/`AuditRow` records built from it and never reach back into the
//! navigator.

use chrono::{DateTime, Utc};
use morph_core::i18n::Translate;
use serde::Serialize;

use crate::classify::{classify_decision, classify_risk, humanize, Badge};
use crate::group::AuditGroup;
use crate::normalize::{AuditEvent, UNKNOWN};
use crate::types::{LogFile, WindowMeta};

/// Why the event list is empty when nothing is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// The service reported `exists: false`.
    NoFile,
    /// The file exists but the window holds no events.
    NoEvents,
}

impl EmptyState {
    pub fn message_key(self) -> &'static str {
        match self {
            Self::NoFile => "audit_no_file",
            Self::NoEvents => "audit_empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSnapshot {
    pub files: Vec<LogFile>,
    pub selected_file: String,
    pub meta: WindowMeta,
    pub groups: Vec<AuditGroup>,
    pub can_go_newer: bool,
    pub can_go_older: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub empty_state: Option<EmptyState>,
}

impl AuditSnapshot {
    pub fn event_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    /// Display rows for every group, labels resolved through `tr`.
    pub fn present(&self, tr: &dyn Translate) -> Vec<GroupView> {
        present_groups(&self.groups, self.meta.from, tr)
    }
}

pub fn empty_state(meta: &WindowMeta, groups: &[AuditGroup], loading: bool) -> Option<EmptyState> {
    if loading || !groups.is_empty() {
        return None;
    }
    Some(if meta.exists {
        EmptyState::NoEvents
    } else {
        EmptyState::NoFile
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub key: String,
    pub run_id: String,
    pub rows: Vec<AuditRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuditRow {
    Event(EventRow),
    Raw(RawRow),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    pub key: String,
    pub event_id: String,
    pub time: String,
    pub action: String,
    pub tool: String,
    pub run_id: String,
    pub step: String,
    pub actor: String,
    pub approval: String,
    pub summary: String,
    pub reasons: String,
    pub decision: Badge,
    pub risk: Badge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub key: String,
    pub raw: String,
}

pub fn present_groups(groups: &[AuditGroup], window_from: u64, tr: &dyn Translate) -> Vec<GroupView> {
    groups
        .iter()
        .map(|group| GroupView {
            key: group.key.clone(),
            run_id: group.run_id.clone(),
            rows: group
                .items
                .iter()
                .map(|event| present_event(event, window_from, tr))
                .collect(),
        })
        .collect()
}

pub fn present_event(event: &AuditEvent, window_from: u64, tr: &dyn Translate) -> AuditRow {
    let key = event.render_key(window_from);
    match event {
        AuditEvent::Unparsed(line) => AuditRow::Raw(RawRow {
            key,
            raw: line.raw.clone(),
        }),
        AuditEvent::Parsed(parsed) => AuditRow::Event(EventRow {
            key,
            event_id: parsed.event_id.clone(),
            time: format_time(&parsed.ts_raw),
            action: humanize(&parsed.action_type_raw),
            tool: parsed.tool_name.clone(),
            run_id: parsed.run_id.clone(),
            step: parsed.step.clone(),
            actor: parsed.actor.clone(),
            approval: humanize(&parsed.approval_status_raw),
            summary: parsed.summary.clone(),
            reasons: if parsed.reasons.is_empty() {
                UNKNOWN.to_string()
            } else {
                parsed.reasons.join(" | ")
            },
            decision: classify_decision(&parsed.decision_raw, tr),
            risk: classify_risk(&parsed.risk_raw, tr),
        }),
    }
}

/// RFC3339 timestamps render as UTC wall-clock time; anything else is shown
/// as recorded.
pub fn format_time(ts_raw: &str) -> String {
    let trimmed = ts_raw.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN {
        return UNKNOWN.to_string();
    }
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => trimmed.to_string(),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use morph_core::i18n::{Catalog, Locale};

    use super::*;
    use crate::classify::Severity;
    use crate::group::group_by_run;
    use crate::normalize::normalize;

    #[test]
    fn parsed_event_row_is_humanized() {
        let event = normalize(
            r#"{"event_id":"e1","ts":"2026-02-01T12:30:00+02:00","action_type":"toolCall","approval_status":"pending_review","reasons":["a","b"],"decision":"require_approval","risk_level":"medium"}"#,
            0,
        );
        let AuditRow::Event(row) = present_event(&event, 40, &Catalog::new(Locale::En)) else {
            panic!("expected event row");
        };
        assert_eq!(row.key, "40-0-e1");
        assert_eq!(row.time, "2026-02-01 10:30:00 UTC");
        assert_eq!(row.action, "tool Call");
        assert_eq!(row.approval, "pending review");
        assert_eq!(row.reasons, "a | b");
        assert_eq!(row.decision.label, "Require Approval");
        assert_eq!(row.decision.severity, Severity::Warning);
        assert_eq!(row.risk.severity, Severity::Warning);
        assert_eq!(row.summary, "-");
    }

    #[test]
    fn raw_rows_keep_text() {
        let row = present_event(&normalize("not json", 7), 0, &Catalog::default());
        assert_eq!(
            row,
            AuditRow::Raw(RawRow {
                key: "0-7-raw".into(),
                raw: "not json".into()
            })
        );
    }

    #[test]
    fn empty_state_distinguishes_missing_file() {
        let mut meta = WindowMeta::default();
        assert_eq!(empty_state(&meta, &[], false), Some(EmptyState::NoFile));
        meta.exists = true;
        assert_eq!(empty_state(&meta, &[], false), Some(EmptyState::NoEvents));
        assert_eq!(empty_state(&meta, &[], true), None);
        let groups = group_by_run(&[normalize("{}", 0)]);
        assert_eq!(empty_state(&meta, &groups, false), None);
    }

    #[test]
    fn time_formatting_passes_through_unknown_formats() {
        assert_eq!(format_time("-"), "-");
        assert_eq!(format_time("yesterday"), "yesterday");
        assert_eq!(format_time("2026-01-01T00:00:00Z"), "2026-01-01 00:00:00 UTC");
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
