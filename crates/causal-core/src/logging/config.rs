use crate::logging::formatter::LogFormat;
use crate::logging::LOG_FILE_ENV;
use std::path::PathBuf;

/// Configuration for logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive (error, warn, info, debug, trace, `causal_core=debug`)
    pub level: String,
    /// Path to log file (None = no file logging)
    pub file: Option<PathBuf>,
    /// Log to stderr (true) or only to file (false)
    pub console: bool,
    /// Log format (text or json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            file: std::env::var(LOG_FILE_ENV).ok().map(PathBuf::from),
            console: true,
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new(level: String, file: Option<PathBuf>, console: bool, format: LogFormat) -> Self {
        Self {
            level,
            file,
            console,
            format,
        }
    }

    /// Same configuration with JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }
}
