//! `morph audit`: prints one window of the guard audit trail.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use morph_audit::error::LogServiceError;
use morph_audit::local::LocalAuditLogService;
use morph_audit::navigator::{FetchOutcome, WindowNavigator};
use morph_audit::service::LogWindowService;
use morph_audit::types::{LogFile, WindowMeta};
use morph_audit::view::{format_bytes, AuditRow, AuditSnapshot, EmptyState, GroupView};
use morph_core::config::{expand_tilde, ConsoleConfig};
use morph_core::i18n::{Catalog, Locale, Translate};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::debug;

use crate::CommandOutput;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ParsedArgs {
    help: bool,
    json: bool,
    files: bool,
    file: String,
    older: usize,
    newer: usize,
    lang: String,
    dir: String,
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct JsonWindow<'a> {
    file: &'a str,
    #[serde(flatten)]
    meta: &'a WindowMeta,
    can_go_newer: bool,
    can_go_older: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_state: Option<EmptyState>,
    event_count: usize,
    groups: Vec<GroupView>,
}

#[derive(Debug, Serialize)]
struct JsonFiles<'a> {
    selected_file: &'a str,
    items: &'a [LogFile],
}

/// Runs against an injected service with default configuration.
pub fn run_for_test(args: &[&str], service: Arc<dyn LogWindowService>) -> CommandOutput {
    let owned_args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run_with_service(
        &owned_args,
        service,
        &ConsoleConfig::default(),
        &mut stdout,
        &mut stderr,
    );
    CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    }
}

pub fn run_with_service(
    args: &[String],
    service: Arc<dyn LogWindowService>,
    cfg: &ConsoleConfig,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let result = parse_args(args).and_then(|parsed| execute(&parsed, service, cfg, stdout));
    exit_code(result, stderr)
}

/// Resolves configuration (file, environment, flags), installs logging and
/// reads the audit log from disk.
pub fn run_local(args: &[String], stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let result = parse_args(args).and_then(|parsed| {
        if parsed.help {
            return write_help(stdout);
        }
        let cfg = load_config(&parsed)?;
        morph_core::logging::init(&cfg.logging);
        debug!(path = %cfg.audit_path().display(), "reading local audit log");
        let service = Arc::new(LocalAuditLogService::from_config(&cfg));
        execute(&parsed, service, &cfg, stdout)
    });
    exit_code(result, stderr)
}

fn exit_code(result: Result<(), String>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            1
        }
    }
}

fn load_config(parsed: &ParsedArgs) -> Result<ConsoleConfig, String> {
    let mut cfg = ConsoleConfig::load(parsed.config.as_deref()).map_err(|err| err.to_string())?;
    if !parsed.dir.trim().is_empty() {
        cfg.audit.dir = expand_tilde(parsed.dir.trim());
        cfg.validate()
            .map_err(|err| format!("invalid config: {err}"))?;
    }
    Ok(cfg)
}

fn execute(
    parsed: &ParsedArgs,
    service: Arc<dyn LogWindowService>,
    cfg: &ConsoleConfig,
    stdout: &mut dyn Write,
) -> Result<(), String> {
    if parsed.help {
        return write_help(stdout);
    }

    let locale = if parsed.lang.trim().is_empty() {
        Locale::normalize(&cfg.ui.locale)
    } else {
        Locale::normalize(&parsed.lang)
    };
    let catalog = Catalog::new(locale);
    let nav = WindowNavigator::new(service);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("start runtime: {err}"))?;
    runtime.block_on(navigate(&nav, parsed, &catalog))?;

    let snapshot = nav.snapshot();
    match (parsed.files, parsed.json) {
        (true, true) => write_json(
            stdout,
            &JsonFiles {
                selected_file: &snapshot.selected_file,
                items: &snapshot.files,
            },
        ),
        (true, false) => render_files(&snapshot, &catalog, stdout),
        (false, true) => write_json(
            stdout,
            &JsonWindow {
                file: &snapshot.selected_file,
                meta: &snapshot.meta,
                can_go_newer: snapshot.can_go_newer,
                can_go_older: snapshot.can_go_older,
                empty_state: snapshot.empty_state,
                event_count: snapshot.event_count(),
                groups: snapshot.present(&catalog),
            },
        ),
        (false, false) => render_window(&snapshot, parsed, &catalog, stdout),
    }
}

async fn navigate(
    nav: &WindowNavigator,
    parsed: &ParsedArgs,
    catalog: &Catalog,
) -> Result<(), String> {
    let load_failed = |err: &LogServiceError| {
        let message = format!("{}: {err}", catalog.t("msg_load_failed", &[]));
        if err.is_retryable() {
            format!("{message} ({})", catalog.t("audit_retry_hint", &[]))
        } else {
            message
        }
    };

    if let Err(err) = nav.load_files().await {
        if parsed.files {
            return Err(load_failed(&err));
        }
        debug!(error = %err, "file list unavailable, using default file");
    }
    if parsed.files {
        return Ok(());
    }

    let file = if parsed.file.trim().is_empty() {
        nav.selected_file()
    } else {
        parsed.file.trim().to_string()
    };
    nav.load_latest(&file).await.map_err(|err| load_failed(&err))?;

    for _ in 0..parsed.older {
        if nav.load_older().await.map_err(|err| load_failed(&err))? != FetchOutcome::Loaded {
            break;
        }
    }
    for _ in 0..parsed.newer {
        if nav.load_newer().await.map_err(|err| load_failed(&err))? != FetchOutcome::Loaded {
            break;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(stdout: &mut dyn Write, payload: &T) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut *stdout, payload).map_err(|err| err.to_string())?;
    writeln!(stdout).map_err(|err| err.to_string())
}

fn write_help(stdout: &mut dyn Write) -> Result<(), String> {
    writeln!(stdout, "{HELP_TEXT}").map_err(|err| err.to_string())
}

fn render_files(
    snapshot: &AuditSnapshot,
    catalog: &Catalog,
    stdout: &mut dyn Write,
) -> Result<(), String> {
    if snapshot.files.is_empty() {
        writeln!(stdout, "{}", catalog.t("audit_no_file", &[])).map_err(|err| err.to_string())?;
        return Ok(());
    }

    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(
        tw,
        "{}\t{}\t{}\t",
        catalog.t("audit_file", &[]).to_uppercase(),
        catalog.t("audit_size", &[]).to_uppercase(),
        catalog.t("audit_modified", &[]).to_uppercase(),
    )
    .map_err(|err| err.to_string())?;
    for file in &snapshot.files {
        let marker = if file.current {
            format!("({})", catalog.t("audit_current", &[]))
        } else {
            String::new()
        };
        writeln!(
            tw,
            "{}\t{}\t{}\t{}",
            file.name,
            format_bytes(file.size_bytes),
            if file.mod_time.is_empty() { "-" } else { file.mod_time.as_str() },
            marker,
        )
        .map_err(|err| err.to_string())?;
    }
    tw.flush().map_err(|err| err.to_string())
}

fn render_window(
    snapshot: &AuditSnapshot,
    parsed: &ParsedArgs,
    catalog: &Catalog,
    stdout: &mut dyn Write,
) -> Result<(), String> {
    let meta = &snapshot.meta;
    let label = |key: &str| catalog.t(key, &[]);

    writeln!(stdout, "{}: {}", label("audit_file"), snapshot.selected_file)
        .map_err(|err| err.to_string())?;
    if !meta.path.is_empty() {
        writeln!(stdout, "{}: {}", label("audit_path"), meta.path)
            .map_err(|err| err.to_string())?;
    }
    if meta.exists {
        writeln!(stdout, "{}: {}", label("audit_size"), format_bytes(meta.size_bytes))
            .map_err(|err| err.to_string())?;
        writeln!(stdout, "{}: {}..{}", label("audit_range"), meta.from, meta.to)
            .map_err(|err| err.to_string())?;
    }
    if snapshot.can_go_older {
        let hint = format!("--older {}", parsed.older.saturating_add(1));
        writeln!(stdout, "{}", catalog.t("audit_has_older", &[("hint", &hint)]))
            .map_err(|err| err.to_string())?;
    }

    if let Some(empty) = snapshot.empty_state {
        writeln!(stdout).map_err(|err| err.to_string())?;
        writeln!(stdout, "{}", label(empty.message_key())).map_err(|err| err.to_string())?;
        return Ok(());
    }

    for group in snapshot.present(catalog) {
        writeln!(stdout).map_err(|err| err.to_string())?;
        writeln!(
            stdout,
            "{}: {} ({}: {})",
            label("audit_run"),
            group.run_id,
            label("audit_group_count"),
            group.rows.len()
        )
        .map_err(|err| err.to_string())?;
        render_group(&group, catalog, stdout)?;
    }
    Ok(())
}

fn render_group(group: &GroupView, catalog: &Catalog, stdout: &mut dyn Write) -> Result<(), String> {
    const COLUMNS: [&str; 10] = [
        "audit_time",
        "audit_decision",
        "audit_risk",
        "audit_action",
        "audit_tool",
        "audit_step",
        "audit_actor",
        "audit_approval",
        "audit_summary",
        "audit_reasons",
    ];

    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|key| catalog.t(key, &[]).to_uppercase())
        .collect();
    writeln!(tw, "{}", header.join("\t")).map_err(|err| err.to_string())?;

    for row in &group.rows {
        let line = match row {
            AuditRow::Event(event) => format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                event.time,
                event.decision.label,
                event.risk.label,
                event.action,
                event.tool,
                event.step,
                event.actor,
                event.approval,
                event.summary,
                event.reasons,
            ),
            AuditRow::Raw(raw) => format!(
                "-\t{}\t-\t-\t-\t-\t-\t-\t{}\t-",
                catalog.t("audit_raw", &[]),
                raw.raw
            ),
        };
        writeln!(tw, "{line}").map_err(|err| err.to_string())?;
    }
    tw.flush().map_err(|err| err.to_string())
}

fn parse_args(args: &[String]) -> Result<ParsedArgs, String> {
    let mut index = 0usize;
    if args.get(index).is_some_and(|token| token == "audit") {
        index += 1;
    }

    let mut parsed = ParsedArgs::default();
    let mut positionals = Vec::new();

    while let Some(token) = args.get(index) {
        match token.as_str() {
            "-h" | "--help" | "help" => {
                parsed.help = true;
                index += 1;
            }
            "--json" => {
                parsed.json = true;
                index += 1;
            }
            "--files" => {
                parsed.files = true;
                index += 1;
            }
            "--file" => {
                parsed.file = take_value(args, index, "--file")?;
                index += 2;
            }
            "--older" => {
                parsed.older = take_count(args, index, "--older")?;
                index += 2;
            }
            "--newer" => {
                parsed.newer = take_count(args, index, "--newer")?;
                index += 2;
            }
            "--lang" => {
                parsed.lang = take_value(args, index, "--lang")?;
                index += 2;
            }
            "--dir" => {
                parsed.dir = take_value(args, index, "--dir")?;
                index += 2;
            }
            "--config" => {
                parsed.config = Some(PathBuf::from(take_value(args, index, "--config")?));
                index += 2;
            }
            flag if flag.starts_with('-') => {
                return Err(format!("error: unknown argument for audit: '{flag}'"));
            }
            value => {
                positionals.push(value.to_string());
                index += 1;
            }
        }
    }

    if !positionals.is_empty() {
        return Err("error: audit does not accept positional arguments".to_string());
    }
    if parsed.files && (parsed.older > 0 || parsed.newer > 0) {
        return Err("error: --files cannot be combined with --older or --newer".to_string());
    }

    Ok(parsed)
}

fn take_value(args: &[String], index: usize, flag: &str) -> Result<String, String> {
    args.get(index + 1)
        .cloned()
        .ok_or_else(|| format!("error: missing value for {flag}"))
}

fn take_count(args: &[String], index: usize, flag: &str) -> Result<usize, String> {
    let value = take_value(args, index, flag)?;
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("error: invalid value '{value}' for {flag}"))
}

const HELP_TEXT: &str = "Browse the guard audit trail

Usage:
  morph audit [flags]

Examples:
  morph audit
  morph audit --older 2
  morph audit --file guard_audit.jsonl.1 --json
  morph audit --files

Flags:
      --file string     audit file to read (default: the live file)
      --older int       step this many windows back in time
      --newer int       step forward again after --older
      --files           list the live file and its rotated siblings
      --json            output in JSON format
      --lang string     display language (en, zh, ja)
      --dir string      directory holding the audit log
      --config string   path to config.yaml";
