//! Run grouping over the rendered (newest-first) event list.

use serde::Serialize;

use crate::normalize::AuditEvent;

/// Consecutive events that share a run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditGroup {
    /// `run:{run_id}:{position of the first item}`; a run split by another
    /// run's events yields one group per stretch, each with its own key.
    pub key: String,
    pub run_id: String,
    pub items: Vec<AuditEvent>,
}

/// Single left-to-right scan; a new group opens whenever the run id differs
/// from the open group's. Groups keep first-appearance order.
pub fn group_by_run(events: &[AuditEvent]) -> Vec<AuditGroup> {
    let mut groups: Vec<AuditGroup> = Vec::new();
    for (position, event) in events.iter().enumerate() {
        let run_id = event.run_id();
        match groups.last_mut() {
            Some(open) if open.run_id == run_id => open.items.push(event.clone()),
            _ => groups.push(AuditGroup {
                key: format!("run:{run_id}:{position}"),
                run_id: run_id.to_string(),
                items: vec![event.clone()],
            }),
        }
    }
    groups
}
