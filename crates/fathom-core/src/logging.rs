//! Structured logging setup for the runtime.
//!
//! Embedders call [`init_logging`] once at startup; library code itself
//! only emits `tracing` events and never installs a subscriber.

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// How the runtime's diagnostics are formatted and filtered.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level to emit when `RUST_LOG` is unset.
    pub level: Level,
    /// Include thread ids in each event.
    pub with_thread_ids: bool,
    /// Include file and line of the emitting call site.
    pub with_source_location: bool,
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_thread_ids: false,
            with_source_location: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Default human-readable configuration at info level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback minimum level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable thread ids.
    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.with_thread_ids = enable;
        self
    }

    /// Enable or disable call-site locations.
    pub fn with_source_location(mut self, enable: bool) -> Self {
        self.with_source_location = enable;
        self
    }

    /// Enable or disable JSON output.
    pub fn with_json_format(mut self, enable: bool) -> Self {
        self.json_format = enable;
        self
    }

    /// Verbose human-readable configuration for local debugging.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            with_thread_ids: true,
            with_source_location: true,
            json_format: false,
        }
    }

    /// JSON configuration for log aggregation.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            with_thread_ids: false,
            with_source_location: false,
            json_format: true,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level when set. Returns `false` if
/// a subscriber was already installed, which tests treat as success.
pub fn init_logging(config: LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location)
            .with_target(config.with_source_location);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    }
}

/// Install the default configuration.
pub fn init_default_logging() -> bool {
    init_logging(LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
    }

    #[test]
    fn test_builder_chain() {
        let config = LoggingConfig::new()
            .with_level(Level::TRACE)
            .with_thread_ids(true)
            .with_json_format(true);
        assert_eq!(config.level, Level::TRACE);
        assert!(config.with_thread_ids);
        assert!(config.json_format);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(LoggingConfig::development().level, Level::DEBUG);
        assert!(LoggingConfig::production().json_format);
        assert!(!LoggingConfig::development().json_format);
    }
}
