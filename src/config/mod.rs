//! Configuration System for mamdani
//!
//! Runtime settings for the engine and the command-line driver:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! The fuzzy system itself (variables, sets, rule stages) is described by a
//! separate JSON document, see [`crate::system`].
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./mamdani.toml` - Project-local configuration
//! 2. `~/.config/mamdani/config.toml` - User configuration (XDG)
//! 3. `~/.mamdani/config.toml` - User configuration (legacy)
//! 4. `/etc/mamdani/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `MAMDANI_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `MAMDANI_FORMAT` - Default output format (text, json, markdown)
//! - `MAMDANI_SHOW_TRACE` - Print the execution trace (true/false)
//! - `MAMDANI_DERIVED_PREFIX` - Name prefix of derived stage variables
//! - `MAMDANI_TRACE_PRECISION` - Decimal places kept for trace strengths
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//! format = "text"
//! show_trace = true
//!
//! [inference]
//! derived_prefix = "computed_"
//! trace_precision = 4
//! check_stage_order = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fuzzy::trace::MAX_TRACE_PRECISION;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MamdaniConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Engine settings
    pub inference: InferenceSettings,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Default output format
    pub format: OutputFormat,
    /// Print the execution trace after the results
    pub show_trace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            format: OutputFormat::Text,
            show_trace: false,
        }
    }
}

/// Settings consumed by [`crate::InferenceEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Prefix of the input variable synthesized for each output variable
    pub derived_prefix: String,
    /// Decimal places kept for firing strengths in the trace
    pub trace_precision: u32,
    /// Reject stage orders that read a derived variable before it is produced
    pub check_stage_order: bool,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            derived_prefix: "computed_".to_string(),
            trace_precision: 4,
            check_stage_order: true,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl MamdaniConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations, then apply environment
    /// variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        config.check_values(path)?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let path = Path::new("<string>");
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        config.check_values(path)?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used
    fn check_values(&self, path: &Path) -> Result<(), ConfigError> {
        if self.inference.trace_precision > MAX_TRACE_PRECISION {
            return Err(ConfigError::InvalidValue(
                path.to_path_buf(),
                format!(
                    "inference.trace_precision = {} exceeds the maximum of {}",
                    self.inference.trace_precision, MAX_TRACE_PRECISION
                ),
            ));
        }
        Ok(())
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from("./mamdani.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mamdani").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".mamdani").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/mamdani/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MAMDANI_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }

        if let Some(val) = lookup("MAMDANI_FORMAT") {
            if let Some(format) = OutputFormat::from_str(&val) {
                self.general.format = format;
            }
        }

        if let Some(val) = lookup("MAMDANI_SHOW_TRACE") {
            self.general.show_trace = val == "true" || val == "1" || val == "yes";
        }

        if let Some(val) = lookup("MAMDANI_DERIVED_PREFIX") {
            if !val.is_empty() {
                self.inference.derived_prefix = val;
            }
        }

        if let Some(val) = lookup("MAMDANI_TRACE_PRECISION") {
            if let Ok(places) = val.parse::<u32>() {
                self.inference.trace_precision = places.min(MAX_TRACE_PRECISION);
            }
        }
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# mamdani configuration file

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Output format: text, json, markdown
format = "text"
# Print the execution trace after the results
show_trace = false

[inference]
# Prefix of the input variable carrying a stage result to later stages
derived_prefix = "computed_"
# Decimal places kept for firing strengths in the trace
trace_precision = 4
# Reject stage priorities that read a derived variable before it exists
check_stage_order = true
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error reading/writing config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Value out of its accepted range
    InvalidValue(PathBuf, String),
    /// Serialization error
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::InvalidValue(path, msg) => {
                write!(f, "Invalid value in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::FuzzyError {
    fn from(err: ConfigError) -> Self {
        use crate::error::{ErrorCode, FuzzyError};
        let code = match err {
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::InvalidValue(..) => ErrorCode::InvalidConfigValue,
            ConfigError::SerializeError(_) => ErrorCode::ConfigError,
        };
        FuzzyError::new(code, err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MamdaniConfig::new();
        assert_eq!(config.inference.derived_prefix, "computed_");
        assert_eq!(config.inference.trace_precision, 4);
        assert!(config.inference.check_stage_order);
        assert_eq!(config.general.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"
            show_trace = true

            [inference]
            derived_prefix = "derived_"
            trace_precision = 2
        "#;

        let config = MamdaniConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert!(config.general.show_trace);
        assert_eq!(config.inference.derived_prefix, "derived_");
        assert_eq!(config.inference.trace_precision, 2);
        // unspecified keys keep their defaults
        assert!(config.inference.check_stage_order);
    }

    #[test]
    fn test_default_content_parses() {
        let config = MamdaniConfig::load_from_str(MamdaniConfig::default_config_content()).unwrap();
        assert_eq!(config.inference, InferenceSettings::default());
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let result = MamdaniConfig::load_from_str("[inference]\ntrace_precision = \"many\"");
        assert!(matches!(result, Err(ConfigError::ParseError(..))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MAMDANI_LOG_LEVEL", "debug"),
            ("MAMDANI_FORMAT", "md"),
            ("MAMDANI_SHOW_TRACE", "yes"),
            ("MAMDANI_DERIVED_PREFIX", "prev_"),
            ("MAMDANI_TRACE_PRECISION", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = MamdaniConfig::new();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.general.format, OutputFormat::Markdown);
        assert!(config.general.show_trace);
        assert_eq!(config.inference.derived_prefix, "prev_");
        assert_eq!(config.inference.trace_precision, 4);
    }

    #[test]
    fn test_oversized_trace_precision_rejected() {
        let result = MamdaniConfig::load_from_str("[inference]\ntrace_precision = 400");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
        assert_eq!(
            crate::error::FuzzyError::from(err).code,
            crate::error::ErrorCode::InvalidConfigValue
        );

        let config = MamdaniConfig::load_from_str("[inference]\ntrace_precision = 15").unwrap();
        assert_eq!(config.inference.trace_precision, 15);
    }

    #[test]
    fn test_trace_precision_override_is_capped() {
        let mut config = MamdaniConfig::new();
        config.apply_overrides(|key| {
            (key == "MAMDANI_TRACE_PRECISION").then(|| "4000000000".to_string())
        });
        assert_eq!(config.inference.trace_precision, MAX_TRACE_PRECISION);
    }

    #[test]
    fn test_log_level_directives() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::Quiet.filter_directive(), "error");
        assert_eq!(LogLevel::Debug.filter_directive(), "debug");
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn test_serialize_config() {
        let toml = MamdaniConfig::new().to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[inference]"));
    }

    #[test]
    fn test_config_paths() {
        let paths = MamdaniConfig::config_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("mamdani.toml"));
    }
}
