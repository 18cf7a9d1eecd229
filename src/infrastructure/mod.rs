//! Adapters for the domain ports: log sinks and periodic triggers.

pub mod file_log;
pub mod in_memory;
pub mod interval_trigger;
pub mod manual_trigger;

use chrono::Local;

/// Prefixes a log line with the local wall-clock time.
pub(crate) fn timestamped(line: &str) -> String {
    format!("{}: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line)
}
