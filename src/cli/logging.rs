//! Logging utilities for CLI output
//!
//! Library diagnostics go through `tracing`; this is only the plain stdout
//! channel for command results.

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_distinct() {
        assert_ne!(LogLevel::Quiet, LogLevel::Normal);
        assert_ne!(LogLevel::Normal, LogLevel::Verbose);
    }

    #[test]
    fn test_log_never_panics_at_any_level() {
        for level in [LogLevel::Quiet, LogLevel::Normal, LogLevel::Verbose] {
            log(level, LogLevel::Normal, "normal");
            log(level, LogLevel::Verbose, "verbose");
        }
    }
}
