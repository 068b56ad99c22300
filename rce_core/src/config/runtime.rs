// RUNTIME PREFERENCES (Engine behaviour and logging)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Errors raised while loading runtime configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether `compare` requires equal parameter counts between call contracts
    pub strict_parameter_arity: bool,

    /// Whether includes/excludes are skipped once the type set already failed
    pub skip_membership_on_type_mismatch: bool,

    /// Whether `attach` copies inherited members onto the subject by default
    pub backfill_on_attach: bool,

    /// Whether the validator warns about own members no contract covers
    pub report_uncovered_members: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_parameter_arity: env::var(env_vars::ENGINE_STRICT_ARITY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            skip_membership_on_type_mismatch: env::var(env_vars::ENGINE_SKIP_MEMBERSHIP)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            backfill_on_attach: env::var(env_vars::ENGINE_BACKFILL_ON_ATTACH)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            report_uncovered_members: env::var(env_vars::ENGINE_REPORT_UNCOVERED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level emitted; composition failures are always at least warnings
    pub min_log_level: LogLevel,

    /// Whether to attach the subject currently being composed to every event
    pub include_subject_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_subject_context: env::var(env_vars::LOGGING_INCLUDE_SUBJECT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a configuration document; missing keys fall back to defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Engine
    pub const ENGINE_STRICT_ARITY: &str = "RCE_ENGINE_STRICT_ARITY";
    pub const ENGINE_SKIP_MEMBERSHIP: &str = "RCE_ENGINE_SKIP_MEMBERSHIP_ON_TYPE_MISMATCH";
    pub const ENGINE_BACKFILL_ON_ATTACH: &str = "RCE_ENGINE_BACKFILL_ON_ATTACH";
    pub const ENGINE_REPORT_UNCOVERED: &str = "RCE_ENGINE_REPORT_UNCOVERED_MEMBERS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "RCE_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "RCE_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "RCE_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_SUBJECT: &str = "RCE_LOGGING_INCLUDE_SUBJECT_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("2"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [engine]
            strict_parameter_arity = false

            [logging]
            min_log_level = "debug"
            "#,
        )
        .unwrap();

        assert!(!config.engine.strict_parameter_arity);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert_eq!(
            config.engine.backfill_on_attach,
            EngineConfig::default().backfill_on_attach
        );
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = RuntimeConfig::from_toml_str("[engine]\nstrict_parameter_arity = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rce.toml");
        fs::write(&path, "[engine]\nreport_uncovered_members = true\n").unwrap();

        let config = RuntimeConfig::load_from_file(&path).unwrap();
        assert!(config.engine.report_uncovered_members);

        let missing = RuntimeConfig::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(env_vars::ENGINE_STRICT_ARITY.starts_with("RCE_"));
        assert!(env_vars::LOGGING_MIN_LEVEL.starts_with("RCE_"));
    }
}
