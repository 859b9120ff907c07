//! morph-core: configuration, logging and translation shared by the console crates.
//!
//! Nothing in here talks to the agent service; the audit viewer lives in
//! `morph-audit` and the command surface in `morph-cli`.

pub mod config;
pub mod i18n;
pub mod logging;

/// Crate identity label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "morph-core"
}
