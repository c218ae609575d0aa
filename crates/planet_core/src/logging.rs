//! Process logging for the planet API.
//!
//! Lines go either to stderr (the server binary) or to size-rotated files
//! under an absolute directory. Events are metadata-only:
//! `event=<name> module=<module> status=<start|ok|error> ...`.
//!
//! # Invariants
//! - The first successful `init_logging` wins; repeating it with the same
//!   level and target is a no-op, anything else is an error.
//! - Initialization never panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "planet_api";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Size-rotated files under an absolute directory.
    Directory(PathBuf),
}

impl LogTarget {
    /// `None` selects stderr; a directory must be absolute.
    fn resolve(log_dir: Option<&str>) -> Result<Self, String> {
        let Some(raw) = log_dir else {
            return Ok(Self::Stderr);
        };
        let dir = PathBuf::from(raw.trim());
        if dir.as_os_str().is_empty() || !dir.is_absolute() {
            return Err(format!("log directory must be an absolute path, got `{raw}`"));
        }
        Ok(Self::Directory(dir))
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

struct ActiveLogger {
    level: LevelFilter,
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Starts process logging at `level`.
///
/// `log_dir = None` logs to stderr.
///
/// # Errors
/// - `level` is not one of `off|error|warn|info|debug|trace`.
/// - `log_dir` is blank, relative, or cannot be created.
/// - The backend fails to start.
/// - Logging is already active with another level or target.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), String> {
    let level = level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("unsupported log level `{level}`"))?;
    let target = LogTarget::resolve(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_backend(level, &target)?;
        install_panic_hook();
        info!(
            "event=logging_init module=core status=ok level={} target={} version={}",
            level,
            target,
            env!("CARGO_PKG_VERSION")
        );
        Ok::<_, String>(ActiveLogger {
            level,
            target: target.clone(),
            _handle: handle,
        })
    })?;

    if (active.level, &active.target) != (level, &target) {
        return Err(format!(
            "logging already active as {}@{}; refusing {}@{}",
            active.level, active.target, level, target
        ));
    }
    Ok(())
}

/// Returns the active `(level, target)`, if logging was started.
pub fn logging_status() -> Option<(LevelFilter, LogTarget)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.target.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(level: LevelFilter, target: &LogTarget) -> Result<LoggerHandle, String> {
    let logger = Logger::with(LogSpecification::builder().default(level).build());

    let logger = match target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    logger
        .start()
        .map_err(|err| format!("logger backend failed to start: {err}"))
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous(info);
    }));
}

/// Flattens line breaks and caps `value` at `max_chars` characters.
pub fn sanitize_message(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c });
    let mut capped: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        capped.push_str("...");
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, sanitize_message, LogTarget};
    use log::LevelFilter;

    #[test]
    fn target_requires_absolute_directory() {
        assert_eq!(LogTarget::resolve(None), Ok(LogTarget::Stderr));
        assert!(LogTarget::resolve(Some("logs/dev")).is_err());
        assert!(LogTarget::resolve(Some("  ")).is_err());
    }

    #[test]
    fn unknown_level_is_rejected_before_any_setup() {
        let err = init_logging("verbose", None).unwrap_err();
        assert!(err.contains("verbose"));
    }

    #[test]
    fn sanitize_flattens_and_caps() {
        assert_eq!(sanitize_message("a\nb\rc", 8), "a b c");
        assert_eq!(sanitize_message("Tatooine", 3), "Tat...");
        assert_eq!(sanitize_message("Hoth", 4), "Hoth");
    }

    #[test]
    fn repeated_init_is_accepted_and_conflicting_init_is_refused() {
        let log_dir = tempfile::tempdir().unwrap();
        let dir = log_dir.path().to_str().unwrap().to_string();

        init_logging("info", Some(&dir)).unwrap();
        init_logging(" INFO ", Some(&dir)).unwrap();

        assert!(init_logging("debug", Some(&dir))
            .unwrap_err()
            .contains("refusing"));
        assert!(init_logging("info", None).unwrap_err().contains("refusing"));

        assert_eq!(
            logging_status(),
            Some((
                LevelFilter::Info,
                LogTarget::Directory(log_dir.path().to_path_buf())
            ))
        );
    }
}
