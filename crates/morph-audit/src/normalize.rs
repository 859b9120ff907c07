//! Raw audit line -> typed event.
//!
//! `normalize` is total: any string yields exactly one [`AuditEvent`]. Lines
//! that are not JSON objects are kept verbatim as [`AuditEvent::Unparsed`] so
//! operators still see data the schema does not understand yet.

use serde::Serialize;
use serde_json::{Map, Value};

/// Placeholder for absent or blank text fields and for events without a run.
pub const UNKNOWN: &str = "-";

/// One guard audit record with every field defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEvent {
    /// Position of the line inside its window (oldest = 0).
    pub index: usize,
    pub event_id: String,
    pub ts_raw: String,
    pub step: String,
    pub action_type_raw: String,
    pub tool_name: String,
    pub run_id: String,
    pub actor: String,
    pub approval_status_raw: String,
    pub summary: String,
    pub reasons: Vec<String>,
    /// Empty when absent so classification falls through to the fallback.
    pub decision_raw: String,
    pub risk_raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedLine {
    pub index: usize,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuditEvent {
    Parsed(ParsedEvent),
    Unparsed(UnparsedLine),
}

impl AuditEvent {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Parsed(event) => event.index,
            Self::Unparsed(line) => line.index,
        }
    }

    /// Run identifier used for grouping; `-` for unparsed lines.
    pub fn run_id(&self) -> &str {
        match self {
            Self::Parsed(event) => &event.run_id,
            Self::Unparsed(_) => UNKNOWN,
        }
    }

    /// Key that stays unique across re-renders of the same window.
    pub fn render_key(&self, window_from: u64) -> String {
        match self {
            Self::Parsed(event) => format!("{window_from}-{}-{}", event.index, event.event_id),
            Self::Unparsed(line) => format!("{window_from}-{}-raw", line.index),
        }
    }
}

pub fn normalize(raw_line: &str, index: usize) -> AuditEvent {
    let object = match serde_json::from_str::<Value>(raw_line) {
        Ok(Value::Object(object)) => object,
        _ => {
            return AuditEvent::Unparsed(UnparsedLine {
                index,
                raw: raw_line.to_string(),
            })
        }
    };

    AuditEvent::Parsed(ParsedEvent {
        index,
        event_id: text_field(&object, "event_id", UNKNOWN),
        ts_raw: text_field(&object, "ts", UNKNOWN),
        step: text_field(&object, "step", UNKNOWN),
        action_type_raw: text_field(&object, "action_type", UNKNOWN),
        tool_name: text_field(&object, "tool_name", UNKNOWN),
        run_id: text_field(&object, "run_id", UNKNOWN),
        actor: text_field(&object, "actor", UNKNOWN),
        approval_status_raw: text_field(&object, "approval_status", UNKNOWN),
        summary: text_field(&object, "action_summary_redacted", UNKNOWN),
        reasons: list_field(&object, "reasons"),
        decision_raw: text_field(&object, "decision", ""),
        risk_raw: text_field(&object, "risk_level", ""),
    })
}

/// Normalizes a window in service order (oldest first).
pub fn normalize_window(lines: &[String]) -> Vec<AuditEvent> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| normalize(line, index))
        .collect()
}

/// Normalizes a window and flips it to display order (newest first).
pub fn rendered_events(lines: &[String]) -> Vec<AuditEvent> {
    let mut events = normalize_window(lines);
    events.reverse();
    events
}

fn text_field(object: &Map<String, Value>, key: &str, fallback: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                fallback.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Some(Value::Number(n)) => truncated_number(n).unwrap_or_else(|| fallback.to_string()),
        _ => fallback.to_string(),
    }
}

fn truncated_number(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return Some(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    let f = n.as_f64()?;
    if !f.is_finite() {
        return None;
    }
    // `+ 0.0` folds -0 into 0.
    Some(format!("{}", f.trunc() + 0.0))
}

fn list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = object.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string().trim().to_string(),
        })
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parsed(event: AuditEvent) -> ParsedEvent {
        match event {
            AuditEvent::Parsed(event) => event,
            AuditEvent::Unparsed(line) => panic!("expected parsed event, got raw {:?}", line.raw),
        }
    }

    #[test]
    fn full_record_maps_every_field() {
        let line = r#"{"event_id":"ev-1","ts":"2026-02-01T10:00:00Z","step":3,"action_type":"tool_call","tool_name":"bash","run_id":"run-9","actor":"agent","approval_status":"pending","action_summary_redacted":"rm -rf [redacted]","reasons":["destructive"," ",null,"outside workspace"],"decision":"deny","risk_level":"high"}"#;
        let event = parsed(normalize(line, 4));
        assert_eq!(event.index, 4);
        assert_eq!(event.event_id, "ev-1");
        assert_eq!(event.ts_raw, "2026-02-01T10:00:00Z");
        assert_eq!(event.step, "3");
        assert_eq!(event.action_type_raw, "tool_call");
        assert_eq!(event.tool_name, "bash");
        assert_eq!(event.run_id, "run-9");
        assert_eq!(event.actor, "agent");
        assert_eq!(event.approval_status_raw, "pending");
        assert_eq!(event.summary, "rm -rf [redacted]");
        assert_eq!(event.reasons, vec!["destructive", "outside workspace"]);
        assert_eq!(event.decision_raw, "deny");
        assert_eq!(event.risk_raw, "high");
    }

    #[test]
    fn missing_fields_default_to_unknown() {
        let event = parsed(normalize("{}", 0));
        assert_eq!(event.event_id, UNKNOWN);
        assert_eq!(event.run_id, UNKNOWN);
        assert_eq!(event.summary, UNKNOWN);
        assert!(event.reasons.is_empty());
        assert_eq!(event.decision_raw, "");
        assert_eq!(event.risk_raw, "");
    }

    #[test]
    fn blank_and_non_text_values_default() {
        let event = parsed(normalize(
            r#"{"event_id":"   ","tool_name":true,"actor":{"name":"x"},"run_id":null,"reasons":"nope"}"#,
            0,
        ));
        assert_eq!(event.event_id, UNKNOWN);
        assert_eq!(event.tool_name, UNKNOWN);
        assert_eq!(event.actor, UNKNOWN);
        assert_eq!(event.run_id, UNKNOWN);
        assert!(event.reasons.is_empty());
    }

    #[test]
    fn numbers_are_truncated() {
        let event = parsed(normalize(r#"{"step":7.9,"run_id":-0.5,"event_id":12}"#, 0));
        assert_eq!(event.step, "7");
        assert_eq!(event.run_id, "0");
        assert_eq!(event.event_id, "12");
    }

    #[test]
    fn reasons_stringify_scalars() {
        let event = parsed(normalize(r#"{"reasons":[1,false," x ",""]}"#, 0));
        assert_eq!(event.reasons, vec!["1", "false", "x"]);
    }

    #[test]
    fn non_objects_are_unparsed_verbatim() {
        for raw in ["not json", "[1,2]", "42", "\"text\"", "null", "", "{\"a\":"] {
            match normalize(raw, 2) {
                AuditEvent::Unparsed(line) => {
                    assert_eq!(line.raw, raw);
                    assert_eq!(line.index, 2);
                }
                AuditEvent::Parsed(_) => panic!("{raw:?} must not parse"),
            }
        }
    }

    #[test]
    fn unparsed_lines_use_the_unknown_run() {
        let event = normalize("not json", 0);
        assert!(!event.is_parsed());
        assert_eq!(event.run_id(), "-");
    }

    #[test]
    fn render_keys_are_window_scoped() {
        assert_eq!(normalize(r#"{"event_id":"e1"}"#, 3).render_key(120), "120-3-e1");
        assert_eq!(normalize("oops", 5).render_key(0), "0-5-raw");
    }

    #[test]
    fn rendered_events_reverse_once() {
        let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let indices: Vec<usize> = rendered_events(&lines).iter().map(AuditEvent::index).collect();
        assert_eq!(indices, vec![2, 1, 0]);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_value(normalize("not json", 0)).unwrap();
        assert_eq!(value["kind"], "unparsed");
        assert_eq!(value["raw"], "not json");
    }
}
