use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();
static DEBUG: AtomicBool = AtomicBool::new(false);

struct Logger {
    file: File,
    tx: Option<mpsc::Sender<String>>,
}

/// Initialize the global logger. Truncates `app.log` in `log_dir`.
/// Calls before `init` are dropped, which keeps library tests quiet.
pub fn init(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log dir {}", log_dir.display()))?;
    let log_path = log_dir.join("app.log");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    LOGGER.set(Mutex::new(Logger { file, tx: None })).ok();
    Ok(())
}

/// Mirror every line to a channel (the binary prints it to stderr).
pub fn set_sender(tx: mpsc::Sender<String>) {
    if let Some(logger) = LOGGER.get() {
        let mut l = logger.lock().unwrap_or_else(|e| e.into_inner());
        l.tx = Some(tx);
    }
}

pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

fn write_log(level: &str, prefix: &str, msg: &str) {
    let Some(logger) = LOGGER.get() else { return };
    let ts = Local::now().format("%H:%M:%S");

    let line = if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level, msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level, prefix, msg)
    };

    let mut l = logger.lock().unwrap_or_else(|e| e.into_inner());
    writeln!(l.file, "{}", line).ok();
    if let Some(tx) = &l.tx {
        tx.send(line).ok();
    }
}

pub fn info(msg: &str) {
    write_log("INFO", "", msg);
}

pub fn warn(msg: &str) {
    write_log("WARN", "", msg);
}

/// Debug lines are only written when enabled with `set_debug`.
pub fn debug_p(prefix: &str, msg: &str) {
    if debug_enabled() {
        write_log("DEBUG", prefix, msg);
    }
}

pub fn info_p(prefix: &str, msg: &str) {
    write_log("INFO", prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    write_log("WARN", prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    write_log("ERROR", prefix, msg);
}
