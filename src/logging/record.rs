//! Log records and their single-line rendering

use std::fmt;

use chrono::{DateTime, Local};

/// ANSI sequence that ends a colored prefix
const COLOR_RESET: &str = "\x1b[0m";

/// Severity of a log record, least to most important
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Full upper-case name of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Four-letter tag used in rendered lines
    pub fn short(&self) -> &'static str {
        &self.as_str()[..4]
    }

    /// ANSI color sequence that opens the prefix of a rendered line
    pub fn color(&self) -> &'static str {
        match self {
            Level::Debug => "\x1b[36m",
            Level::Info => "\x1b[37m",
            Level::Notice => "\x1b[32m",
            Level::Warning => "\x1b[33m",
            Level::Error => "\x1b[31;1m",
            Level::Critical => "\x1b[35;1m",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// A single log record
///
/// Records are immutable once created; the logger assigns `id` from a
/// process-wide sequence.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// When the record was created
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: Level,
    /// Sequence id, rendered as three hex digits
    pub id: u64,
    /// Module that produced the record
    pub module: String,
    /// Message text
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn new(level: Level, id: u64, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            id,
            module: module.into(),
            message: message.into(),
        }
    }

    /// Render as `HH:MM:SS.mmm ▶ LEVL 0ID message`, with the prefix colored by level
    pub fn render(&self) -> String {
        format!(
            "{}{} ▶ {} {:03x}{} {}",
            self.level.color(),
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level.short(),
            self.id,
            COLOR_RESET,
            self.message
        )
    }
}

/// Remove the ANSI color sequences that `LogRecord::render` inserts
pub fn strip_color(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("\x1b[") {
        out.push_str(&rest[..start]);
        match rest[start..].find('m') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(level: Level, id: u64, message: &str) -> LogRecord {
        LogRecord {
            timestamp: Local.with_ymd_and_hms(2026, 1, 21, 14, 30, 45).unwrap(),
            level,
            id,
            module: "icm".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Notice);
        assert!(Level::Notice < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn test_level_short_names() {
        assert_eq!(Level::Debug.short(), "DEBU");
        assert_eq!(Level::Notice.short(), "NOTI");
        assert_eq!(Level::Warning.short(), "WARN");
        assert_eq!(Level::Critical.short(), "CRIT");
    }

    #[test]
    fn test_from_tracing_level() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warning);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn test_render_format() {
        let line = record_at(Level::Notice, 0x1f, "logger initialized").render();
        assert!(line.starts_with(Level::Notice.color()));
        assert_eq!(
            strip_color(&line),
            "14:30:45.000 ▶ NOTI 01f logger initialized"
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_render_resets_before_message() {
        let line = record_at(Level::Error, 7, "boom").render();
        assert!(line.ends_with("\x1b[0m boom"));
    }

    #[test]
    fn test_strip_color_plain_text() {
        assert_eq!(strip_color("no color here"), "no color here");
    }
}
