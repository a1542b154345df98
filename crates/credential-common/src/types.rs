//! Types shared across crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic emitted by the session layer
///
/// Ordered from most to least severe, so `level <= threshold` means
/// "at least as important as the threshold".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warning,
    #[default]
    Info,
    Verbose,
    Trace,
}

impl LogLevel {
    /// Whether a message at this level passes the given threshold
    pub fn enabled_at(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Verbose => "verbose",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_threshold() {
        assert!(LogLevel::Error.enabled_at(LogLevel::Info));
        assert!(LogLevel::Info.enabled_at(LogLevel::Info));
        assert!(!LogLevel::Verbose.enabled_at(LogLevel::Info));
        assert!(LogLevel::Trace.enabled_at(LogLevel::Trace));
    }

    #[test]
    fn test_level_serde_names() {
        let level = parse_level("\"warning\"");
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(LogLevel::Verbose.to_string(), "verbose");
    }

    fn parse_level(raw: &str) -> LogLevel {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let doc = format!("level = {raw}");
        toml::from_str::<Wrapper>(&doc).unwrap().level
    }
}
