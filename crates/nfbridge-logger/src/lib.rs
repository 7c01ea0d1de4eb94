//! Console and file logging for nfbridge
//!
//! Every message is appended to a per-run log file; console output is
//! gated by the global verbosity level set at startup. The bridge crate
//! logs through these helpers so a host sees the same trail whether it
//! embeds the bridge or runs the `nfbridge` binary.

use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the per-run log inside the log directory
pub const LOG_FILE_NAME: &str = "nfbridge.log";

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static NO_STDOUT: Mutex<bool> = Mutex::new(false);

/// Get the current verbosity level
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

fn set_verbosity(verbosity: u8) {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
}

/// Get whether console logging is disabled
pub fn get_no_stdout() -> bool {
    NO_STDOUT.lock().ok().map(|v| *v).unwrap_or(false)
}

/// Set whether console logging is disabled
pub fn set_no_stdout(disabled: bool) {
    if let Ok(mut v) = NO_STDOUT.lock() {
        *v = disabled;
    }
}

/// Initialize the logger with a verbosity level
///
/// 0 = warnings and errors only, 1 = debug (-v), 2 = trace (-vv).
/// `log_dir` overrides the default config directory for the log file.
pub fn init_with_verbosity(verbosity: u8, log_dir: Option<&Path>) -> Result<(), String> {
    set_verbosity(verbosity);

    let dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_config_dir()?,
    };
    init_in_dir(&dir)
}

/// Point the log file at `dir`
fn init_in_dir(dir: &Path) -> Result<(), String> {
    let log_file = prepare_log_file(dir)?;
    let mut guard = LOG_FILE
        .lock()
        .map_err(|_| "Log file lock poisoned".to_string())?;
    *guard = Some(log_file);

    Ok(())
}

/// Create `dir` and remove any log left by a previous run
fn prepare_log_file(dir: &Path) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let log_file = dir.join(LOG_FILE_NAME);
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }
    Ok(log_file)
}

/// Get the config directory path
fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let config_dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("nfbridge");

    #[cfg(target_os = "windows")]
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("nfbridge");

    Ok(config_dir)
}

fn format_line(timestamp: &str, source: &str, message: &str) -> String {
    format!("[{}] [{}] {}", timestamp, source, message)
}

fn write_to_log(message: &str) {
    if let Ok(guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                let _ = writeln!(file, "{}", format_line(&timestamp, "BRIDGE", message));
            }
        }
    }
}

fn console_enabled() -> bool {
    !get_no_stdout()
}

/// Log an informational message (to console if verbose >= 1, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if console_enabled() && get_verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

/// Log a debug message (to console if verbose >= 1, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if console_enabled() && get_verbosity() >= 1 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Log a warning message (to both file and console)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    if console_enabled() {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }
}

/// Log an error message (to both file and console)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    if console_enabled() {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
}

/// Log a success message
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    if console_enabled() {
        eprintln!("{} {}", "\u{2714}".green().bold(), message);
    }
}

/// Log a lifecycle step (console only at -vv)
pub fn step(message: &str) {
    if console_enabled() && get_verbosity() >= 2 {
        eprintln!("TRACE: {}", message);
    }
    write_to_log(&format!("STEP: {}", message));
}

/// Get the log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file path to the user
pub fn show_log_path() {
    if let Some(path) = get_log_path() {
        eprintln!("Log file: {}", path.display());
    } else if let Ok(config_dir) = get_config_dir() {
        eprintln!("Log file: {}", config_dir.join(LOG_FILE_NAME).display());
    } else {
        eprintln!("Log file location not available");
    }
}
