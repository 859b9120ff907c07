//! Console configuration.
//!
//! Root configuration struct and nested section types with defaults,
//! validation, YAML file loading, environment variable overrides, and tilde
//! path expansion.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the live audit file written by the guard.
pub const DEFAULT_AUDIT_FILE: &str = "guard_audit.jsonl";

const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

/// Root configuration for the operator console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

impl ConsoleConfig {
    /// Loads configuration: defaults, then the YAML file (explicit path or the
    /// first one found on the search path), then `MORPH_*` environment
    /// overrides. The result is tilde-expanded and validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };
        let mut cfg = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_yaml_file(&path)?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.expand_paths();
        cfg.validate().map_err(ConfigError::Invalid)?;
        Ok(cfg)
    }

    /// Parses a YAML config file. Missing sections keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| err.to_string())
    }

    /// Applies `MORPH_*` overrides. `lookup` abstracts the environment so
    /// tests do not have to mutate process state.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(dir) = non_empty("MORPH_AUDIT_DIR") {
            self.audit.dir = dir.trim().to_string();
        }
        if let Some(file) = non_empty("MORPH_AUDIT_FILE") {
            self.audit.base_file = file.trim().to_string();
        }
        if let Some(level) = non_empty("MORPH_LOG_LEVEL") {
            self.logging.level = level.trim().to_string();
        }
        if let Some(format) = non_empty("MORPH_LOG_FORMAT") {
            self.logging.format = format.trim().to_string();
        }
        if let Some(locale) = non_empty("MORPH_LOCALE") {
            self.ui.locale = locale.trim().to_string();
        }
    }

    /// Full path of the live audit file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.audit.dir).join(&self.audit.base_file)
    }

    /// Validates the entire configuration, returning an error message on failure.
    pub fn validate(&self) -> Result<(), String> {
        // Audit
        if self.audit.dir.trim().is_empty() {
            return Err("audit.dir is required".into());
        }
        let base = self.audit.base_file.trim();
        if base.is_empty() {
            return Err("audit.base_file is required".into());
        }
        if base.contains('/') || base.contains('\\') {
            return Err("audit.base_file must be a file name, not a path".into());
        }

        // Logging
        match self.logging.level.to_lowercase().trim() {
            "debug" | "info" | "warn" | "error" => {}
            _ => return Err("logging.level must be one of debug, info, warn, error".into()),
        }
        match self.logging.format.to_lowercase().trim() {
            "console" | "json" => {}
            _ => return Err("logging.format must be one of console, json".into()),
        }

        // UI
        if self.ui.locale.trim().is_empty() {
            return Err("ui.locale is required".into());
        }

        Ok(())
    }

    /// Expands `~` to home directory in all path-related config fields.
    pub fn expand_paths(&mut self) {
        self.audit.dir = expand_tilde(&self.audit.dir);
    }
}

// ---------------------------------------------------------------------------
// Section configs
// ---------------------------------------------------------------------------

/// Where the audit trail lives and how much of it one window holds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub dir: String,
    pub base_file: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dir: home_dir().join(".morph/guard/audit").display().to_string(),
            base_file: DEFAULT_AUDIT_FILE.into(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "console".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub locale: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            locale: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        return home_dir().display().to_string();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home_dir().join(rest).display().to_string();
    }
    path.to_string()
}

/// Searches for a config file. `MORPH_CONFIG` wins when set.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("MORPH_CONFIG") {
        let explicit = explicit.trim();
        if !explicit.is_empty() {
            return Some(PathBuf::from(expand_tilde(explicit)));
        }
    }
    config_search_paths()
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            paths.push(Path::new(&xdg).join("morph"));
        }
    }

    let home = home_dir();
    if home.as_os_str() != "" {
        paths.push(home.join(".config/morph"));
    }

    paths.push(PathBuf::from("."));
    paths
}

/// Get the user's home directory, falling back to `/` on failure.
fn home_dir() -> PathBuf {
    #[allow(deprecated)]
    std::env::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
