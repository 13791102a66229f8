//! FILENAME: core/grid-model/src/logging.rs
//! PURPOSE: Category logging shared by the grid and date-field engines.
//! CONTEXT: Every line carries a process-wide sequence number and a category
//! tag (`ROWTREE`, `AGG`, `FIELD`, ...) in the unified `seq|category|message`
//! shape. Lines are forwarded to the `log` facade with the category as the
//! target, so the host decides where they end up.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use log::Level;

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter shared by every engine in the process.
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Get next sequence number.
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

/// Write a log line in unified format. Arguments are only formatted when
/// the level is enabled for `category`.
pub fn write_log(level: Level, category: &'static str, message: fmt::Arguments<'_>) {
    if !log::log_enabled!(target: category, level) {
        return;
    }
    let seq = next_seq();
    log::log!(target: category, level, "{}|{}|{}", seq, category, message);
}

/// Write an ENTER log line for function entry.
pub fn write_log_enter(level: Level, category: &'static str, func_name: &str, params: fmt::Arguments<'_>) {
    if params.as_str() == Some("") {
        write_log(level, category, format_args!("ENTER {}", func_name));
    } else {
        write_log(level, category, format_args!("ENTER {} {}", func_name, params));
    }
}

/// Write an EXIT log line for function exit.
pub fn write_log_exit(level: Level, category: &'static str, func_name: &str, result: fmt::Arguments<'_>) {
    if result.as_str() == Some("") {
        write_log(level, category, format_args!("EXIT {}", func_name));
    } else {
        write_log(level, category, format_args!("EXIT {} {}", func_name, result));
    }
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Debug, $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Info, $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Warn, $cat, format_args!($($arg)*))
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, format_args!(""))
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, format_args!(""))
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, format_args!($($arg)*))
    };
}
