//! morph-audit: client side of the audit trail viewer.
//!
//! Reads an append-only JSON-lines audit log through a windowing service and
//! turns each window into grouped, display-ready security events:
//! - `navigator`: cursor state machine, one bounded fetch per action
//! - `normalize` / `classify` / `group`: pure view-model computation
//! - `service`: the `LogWindowService` seam, with `local` (file-backed) and
//!   `mock` implementations

pub mod classify;
pub mod error;
pub mod event;
pub mod group;
pub mod local;
pub mod mock;
pub mod navigator;
pub mod normalize;
pub mod service;
pub mod types;
pub mod view;

/// Stable crate label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "morph-audit"
}
