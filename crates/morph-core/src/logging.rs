//! Structured logging setup.
//!
//! Installs a `tracing` subscriber writing to stderr so stdout stays reserved
//! for command output. `MORPH_LOG` (EnvFilter syntax) overrides the configured
//! level.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const LOG_FILTER_ENV: &str = "MORPH_LOG";

/// Builds the filter for the configured level; `MORPH_LOG` wins when it parses.
pub fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&cfg.level)))
}

fn default_directive(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Installs the global subscriber. Returns false when one is already set,
/// which happens when the CLI entry point runs more than once in a process.
pub fn init(cfg: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(cfg))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if cfg.format.trim().eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
