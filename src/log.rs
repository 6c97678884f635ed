//! File logging for monthend.
//!
//! The interactive form owns the terminal, so nothing here ever writes to
//! stdout or stderr. Records go to `~/.monthend/monthend.log`, which is
//! truncated each time a process initializes logging. Stage processes spawned
//! by the runner re-initialize with append semantics so one pipeline run ends
//! up in a single file.
//!
//! Debug level is enabled with `--debug` or `MONTHEND_DEBUG=1`. A specific
//! level can be forced with `MONTHEND_LOG=trace|debug|info|warn|error`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set on stage processes so they append to the runner's log file.
pub const APPEND_ENV: &str = "MONTHEND_LOG_APPEND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

/// Resolve the effective level from the `--debug` flag and environment.
pub fn level_from_env(debug: bool) -> LogLevel {
    if let Some(level) = std::env::var("MONTHEND_LOG")
        .ok()
        .and_then(|v| v.parse::<LogLevel>().ok())
    {
        return level;
    }
    let env_debug = std::env::var("MONTHEND_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if debug || env_debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Initialize logging under `~/.monthend/`.
pub fn init(debug: bool) {
    let level = level_from_env(debug);
    let append = std::env::var_os(APPEND_ENV).is_some();
    if let Some(dir) = dirs::home_dir().map(|h| h.join(".monthend")) {
        let _ = std::fs::create_dir_all(&dir);
        init_at(&dir.join("monthend.log"), level, append);
    } else {
        LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    }
}

/// Initialize logging to an explicit file. Only the first call in a process
/// picks the path; later calls just adjust the level.
pub fn init_at(path: &Path, level: LogLevel, append: bool) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    if LOG_PATH.get().is_some() {
        return;
    }
    if !append {
        let _ = std::fs::write(path, "");
    }
    LOG_PATH.set(path.to_path_buf()).ok();
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }
    let Some(path) = LOG_PATH.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let _ = writeln!(
            file,
            "[{}] [{}] [pid {}] {}",
            timestamp,
            level.as_str(),
            std::process::id(),
            msg
        );
    }
}

#[macro_export]
macro_rules! mlog {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_error {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_warn {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_debug {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Debug, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! mlog_trace {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Trace, &format!($($arg)*))
    };
}
