//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` for output gated on `--verbose`
//! - `request` for one-line access logs in serve mode
//!
//! # Example
//!
//! ```ignore
//! log!("publish"; "wrote {}", filename);
//! debug!("store"; "unique name {} -> {}", wanted, chosen);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicI8, Ordering},
    time::Duration,
};

use crate::utils::date::DateTimeUtc;

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Hours added to UTC for access log timestamps.
static UTC_OFFSET: AtomicI8 = AtomicI8::new(8);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Set the offset used for displayed clock times.
pub fn set_utc_offset(hours: i8) {
    UTC_OFFSET.store(hours, Ordering::Relaxed);
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold().to_string(),
        "publish" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// Current local time formatted as HH:MM:SS
fn now() -> String {
    let local = DateTimeUtc::now().with_offset_hours(UTC_OFFSET.load(Ordering::Relaxed));
    format!("{:02}:{:02}:{:02}", local.hour, local.minute, local.second)
}

/// Format an access log line (without prefix).
fn format_request(method: &str, path: &str, status: u16, elapsed: Duration) -> String {
    let status = match status {
        200..=299 => status.green().to_string(),
        300..=399 => status.cyan().to_string(),
        400..=499 => status.yellow().to_string(),
        _ => status.red().to_string(),
    };
    format!(
        "{} {method} {path} {status} {}",
        format!("[{}]", now()).dimmed(),
        format!("{}ms", elapsed.as_millis()).dimmed()
    )
}

/// Access log for one served request. API calls are always logged, static
/// files only with `--verbose`.
pub fn request(method: &str, path: &str, status: u16, elapsed: Duration) {
    if path.starts_with("/api/") || status >= 400 || is_verbose() {
        log("serve", &format_request(method, path, status, elapsed));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_prefix_keeps_module_name() {
        assert!(colorize_prefix("serve", "serve").contains("[serve]"));
        assert!(colorize_prefix("Publish", "publish").contains("[Publish]"));
        assert_ne!(
            colorize_prefix("error", "error"),
            colorize_prefix("store", "store").replace("store", "error")
        );
    }

    #[test]
    fn test_format_request() {
        let line = format_request("GET", "/api/posts", 200, Duration::from_millis(12));
        assert!(line.contains(" GET /api/posts "));
        assert!(line.contains("200"));
        assert!(line.contains("12ms"));
    }

    #[test]
    fn test_now_format() {
        let time = now();
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
    }
}
