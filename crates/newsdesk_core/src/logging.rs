//! Logging bootstrap for newsdesk entry points.
//!
//! # Responsibility
//! - Start one rolling file logger per process, from an explicit level or
//!   from the level resolved into `CoreConfig`.
//! - Route configuration fallbacks and panics into structured
//!   `event=... module=... status=...` lines.
//!
//! # Invariants
//! - The first successful start fixes level and directory; later starts
//!   must request both unchanged or they are rejected.
//! - Starting never panics.
//! - Article titles and body text never reach the log; events carry ids,
//!   counts and error codes only.

use crate::config::CoreConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "newsdesk";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const MAX_DETAIL_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Validated level and absolute directory for the file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    level: &'static str,
    dir: PathBuf,
}

impl LogTarget {
    /// Validates a caller-supplied level and directory.
    ///
    /// # Errors
    /// - `level` is not one of trace|debug|info|warn|error.
    /// - `log_dir` is blank or relative.
    pub fn parse(level: &str, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: normalize_level(level)?,
            dir: absolute_dir(log_dir)?,
        })
    }

    /// Uses the level already resolved from `NEWSDESK_LOG_LEVEL`.
    pub fn from_config(config: &CoreConfig, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: config.log_level,
            dir: absolute_dir(log_dir)?,
        })
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

struct ActiveLogger {
    target: LogTarget,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn ensure_matches(&self, requested: &LogTarget) -> Result<(), String> {
        if self.target.dir != requested.dir {
            return Err(format!(
                "logging already writes to `{}`; refusing to switch to `{}`",
                self.target.dir.display(),
                requested.dir.display()
            ));
        }
        if self.target.level != requested.level {
            return Err(format!(
                "logging already runs at `{}`; refusing to switch to `{}`",
                self.target.level, requested.level
            ));
        }
        Ok(())
    }
}

/// Starts file logging at an explicit level.
///
/// Repeating the call with the same level and directory is a no-op.
///
/// # Errors
/// Invalid arguments, a directory that cannot be created, a logger that
/// fails to start, or a conflict with the already running logger.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    start(LogTarget::parse(level, log_dir)?)
}

/// Starts file logging at the level carried by `config`.
pub fn init_logging_with_config(config: &CoreConfig, log_dir: &str) -> Result<(), String> {
    start(LogTarget::from_config(config, log_dir)?)
}

/// Active `(level, directory)`, or `None` before the first start.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.target.level, active.target.dir.clone()))
}

/// Emits one `config_load` warning event per ignored configuration value.
pub fn report_config_warnings(warnings: &[String]) {
    for warning in warnings {
        warn!(
            "event=config_load module=core status=fallback detail={}",
            one_line_detail(warning)
        );
    }
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn absolute_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = PathBuf::from(trimmed);
    if path.is_relative() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path)
}

fn start(target: LogTarget) -> Result<(), String> {
    ACTIVE_LOGGER
        .get_or_try_init(|| open_logger(&target))?
        .ensure_matches(&target)
}

fn open_logger(target: &LogTarget) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&target.dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            target.dir.display()
        )
    })?;

    let handle = Logger::try_with_str(target.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", target.level))?
        .log_to_file(
            FileSpec::default()
                .directory(target.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    PANIC_HOOK.get_or_init(install_panic_hook);

    info!(
        "event=newsdesk_start module=core status=ok platform={} build={} version={} level={} log_dir={}",
        std::env::consts::OS,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_VERSION"),
        target.level,
        target.dir.display()
    );

    Ok(ActiveLogger {
        target: target.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            panic_payload(panic_info)
        );
        previous(panic_info);
    }));
}

// Payloads may quote article text.
fn panic_payload(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let text = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    one_line_detail(&text)
}

fn one_line_detail(value: &str) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_DETAIL_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_DETAIL_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, init_logging_with_config, logging_status, one_line_detail,
        report_config_warnings, LogTarget, MAX_DETAIL_CHARS,
    };
    use crate::config::{CoreConfig, LOG_LEVEL_ENV};

    #[test]
    fn target_from_config_uses_resolved_level() {
        let loaded = CoreConfig::from_lookup(|key| {
            (key == LOG_LEVEL_ENV).then(|| "Warning".to_string())
        });
        let target = LogTarget::from_config(&loaded.config, "/var/log/newsdesk").unwrap();
        assert_eq!(target.level(), "warn");
        assert_eq!(target.dir().to_str(), Some("/var/log/newsdesk"));
    }

    #[test]
    fn target_rejects_unknown_level_and_relative_dir() {
        let err = LogTarget::parse("chatty", "/var/log/newsdesk").unwrap_err();
        assert!(err.contains("unsupported log level"));

        let err = LogTarget::parse("info", "logs/newsdesk").unwrap_err();
        assert!(err.contains("absolute"));

        let err = LogTarget::from_config(&CoreConfig::default(), "  ").unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn detail_is_flattened_and_capped() {
        assert_eq!(one_line_detail("slug\nlaunch"), "slug launch");

        let long = "x".repeat(MAX_DETAIL_CHARS + 5);
        let detail = one_line_detail(&long);
        assert!(detail.ends_with("..."));
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS + 3);
    }

    // Only test in this binary that starts the global logger.
    #[test]
    fn config_start_fixes_level_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let log_dir_str = log_dir.to_str().unwrap().to_string();
        let other_dir = dir.path().join("elsewhere");

        let config = CoreConfig {
            log_level: "warn",
            ..CoreConfig::default()
        };
        init_logging_with_config(&config, &log_dir_str).unwrap();
        assert!(log_dir.is_dir());
        assert_eq!(logging_status(), Some(("warn", log_dir.clone())));

        init_logging("WARNING", &log_dir_str).unwrap();
        let err = init_logging("debug", &log_dir_str).unwrap_err();
        assert!(err.contains("refusing to switch"));
        let err = init_logging_with_config(&config, other_dir.to_str().unwrap()).unwrap_err();
        assert!(err.contains("refusing to switch"));

        report_config_warnings(&["NEWSDESK_HISTORY_CAPACITY=`many` is not a number".to_string()]);
        assert_eq!(logging_status(), Some(("warn", log_dir)));
    }
}
