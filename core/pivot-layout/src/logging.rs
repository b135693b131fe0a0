//! FILENAME: core/pivot-layout/src/logging.rs
// PURPOSE: Category-tagged logging on top of the `log` facade.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use log::Level;

/// Sequence counter so interleaved engine steps can be ordered in the output.
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::Relaxed) + 1
}

/// Write a log line as `#seq [CATEGORY] message`.
/// Formatting is skipped entirely when the level is disabled.
pub fn write_log(level: Level, category: &str, message: fmt::Arguments<'_>) {
    if !log::log_enabled!(target: "pivot_layout", level) {
        return;
    }
    let seq = next_seq();
    log::log!(target: "pivot_layout", level, "#{} [{}] {}", seq, category, message);
}

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Debug, $cat, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Warn, $cat, format_args!($($arg)*))
    };
}
