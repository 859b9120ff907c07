//! morph-cli: operator command line for the guard audit trail.

use std::io::Write;
use std::sync::{Arc, OnceLock};

use morph_audit::service::LogWindowService;
use morph_core::config::ConsoleConfig;

pub mod audit;

/// Stable crate label used by bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "morph-cli"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

static VERSION: OnceLock<String> = OnceLock::new();

/// Set the version string for `--version` output.
pub fn set_version(version: &str) {
    let _ = VERSION.set(version.to_string());
}

fn get_version() -> &'static str {
    VERSION.get().map(|s| s.as_str()).unwrap_or("dev")
}

fn help_text() -> String {
    "\
morph inspects what the agent guard decided and why.

Usage:
  morph [command]

Available Commands:
  audit       Browse the guard audit trail
  help        Help about any command

Flags:
  -h, --help      help for morph
  -v, --version   version for morph

Use \"morph [command] --help\" for more information about a command.\n"
        .to_string()
}

/// Where `audit` reads from.
enum Source {
    /// The configured audit directory on disk.
    Local,
    Service(Arc<dyn LogWindowService>),
}

/// Entry point for the binary: reads the configured audit directory.
pub fn run_cli(args: &[String]) -> CommandOutput {
    dispatch(args, Source::Local)
}

/// Runs a command line against an injected service.
pub fn run_cli_for_test(args: &[&str], service: Arc<dyn LogWindowService>) -> CommandOutput {
    let owned: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
    dispatch(&owned, Source::Service(service))
}

fn dispatch(args: &[String], source: Source) -> CommandOutput {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let exit_code = match args.first().map(String::as_str) {
        None | Some("help" | "-h" | "--help") => {
            let _ = write!(stdout, "{}", help_text());
            0
        }
        Some("-v" | "--version") => {
            let _ = writeln!(stdout, "morph version {}", get_version());
            0
        }
        Some("audit") => match source {
            Source::Local => audit::run_local(args, &mut stdout, &mut stderr),
            Source::Service(service) => audit::run_with_service(
                args,
                service,
                &ConsoleConfig::default(),
                &mut stdout,
                &mut stderr,
            ),
        },
        Some(other) => {
            let _ = writeln!(
                stderr,
                "error: unknown command \"{other}\" for \"morph\"\nRun 'morph --help' for usage."
            );
            1
        }
    };

    CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    }
}
