//! Session log for the editor and the batch CLI.
//!
//! The GUI writes to `ninepatchfe.log` in the OS data directory, truncated at
//! every launch. The CLI never opens the file; with `--verbose` it echoes log
//! lines to stderr instead. With neither sink installed every call is a no-op,
//! which is what unit tests see.
//!
//! Log location:
//!   Windows:  `%APPDATA%\NinePatchFE\ninepatchfe.log`
//!   Linux:    `~/.local/share/NinePatchFE/ninepatchfe.log`
//!   macOS:    `~/Library/Application Support/NinePatchFE/ninepatchfe.log`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static ECHO: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Path of the open session log, if `init` succeeded.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Mirror every log line to stderr (CLI `--verbose`).
pub fn set_echo(on: bool) {
    ECHO.store(on, Ordering::Relaxed);
}

fn emit(line: &str) {
    if ECHO.load(Ordering::Relaxed) {
        eprintln!("{}", line);
    }
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Format one log record.
pub fn format_record(level: Level, clock: &str, msg: &str) -> String {
    format!("[{}] [{:<5}] {}", clock, level.tag(), msg)
}

pub fn write(level: Level, msg: &str) {
    if LOG_FILE.get().is_none() && !ECHO.load(Ordering::Relaxed) {
        return;
    }
    emit(&format_record(level, &clock(), msg));
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Open (truncating) the GUI session log and route panics into it.
pub fn init() {
    let path = data_dir().join("NinePatchFE").join("ninepatchfe.log");
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {}", path.display(), e);
            return;
        }
    };
    let _ = LOG_FILE.set(Mutex::new(file));
    let _ = LOG_PATH.set(path.clone());

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    emit(&format!("=== NinePatchFE {} session (unix {}) ===", env!("CARGO_PKG_VERSION"), started));
    emit(&format!("log: {}", path.display()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        emit(&format_record(Level::Error, &clock(), &format!("PANIC: {}", info)));
        prev(info);
    }));
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata);
    }
    #[cfg(target_os = "macos")]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Library").join("Application Support");
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".local").join("share"))
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// UTC wall clock, `HH:MM:SS`.
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:02}:{:02}:{:02}", (secs % 86_400) / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_without_a_sink_is_silent() {
        crate::log_info!("loaded {}x{}", 3, 3);
        crate::log_err!("export failed");
        assert!(log_path().is_none());
    }

    #[test]
    fn records_carry_padded_level_tags() {
        assert_eq!(format_record(Level::Info, "12:00:01", "hi"), "[12:00:01] [INFO ] hi");
        assert_eq!(format_record(Level::Error, "00:00:00", "x"), "[00:00:00] [ERROR] x");
    }

    #[test]
    fn clock_is_hh_mm_ss() {
        let c = clock();
        assert_eq!(c.len(), 8);
        assert_eq!(c.matches(':').count(), 2);
    }
}
