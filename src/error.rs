//! Structured Error Handling for mamdani
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error payloads (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - `ParseError` - Malformed system descriptions
//! - `UnknownInput`, `UnknownSet`, ... (2xxx) - Fatal conditions during an inference call
//! - `ValidationError` - Inconsistent system definitions
//! - `ConfigError` - Settings file issues
//!
//! Recoverable conditions (a set outside its variable's domain, a stage with
//! no applicable rule, zero aggregated mass) are not errors. They are logged
//! or surfaced as "no result" by the engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use mamdani::error::{FuzzyError, ErrorCode};
//!
//! fn lookup(name: &str) -> Result<(), FuzzyError> {
//!     Err(FuzzyError::unknown_variable(name)
//!         .with_context("stage", "LoanRules")
//!         .with_hint("Declare the variable under InputSets"))
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Generic parse error
    ParseError = 1000,
    /// Invalid JSON syntax
    InvalidJson = 1001,
    /// Unknown membership shape
    UnknownSetType = 1002,
    /// Shape parameter missing for the declared set type
    MissingShapeField = 1003,
    /// Malformed crisp input argument
    InvalidInputArgument = 1004,

    // Inference errors (2xxx)
    /// A rule names a variable that is not registered
    UnknownVariable = 2001,
    /// A rule names a set the variable does not define
    UnknownSet = 2002,
    /// A rule reads a variable that was not fuzzified
    NotFuzzified = 2003,
    /// An inference call supplies a value for an undeclared input
    UnknownInput = 2004,

    // Validation errors (5xxx)
    /// Generic validation error
    ValidationError = 5000,
    /// Two variables share one name
    DuplicateVariable = 5001,
    /// Domain bounds are reversed or not finite
    InvalidDomain = 5003,
    /// Shape parameters are not ordered
    InvalidShape = 5004,
    /// Stage order is not a valid dependency order
    StageOrder = 5005,
    /// Stage targets an undeclared output variable
    UnknownOutput = 5006,
    /// Two stages target the same output variable
    DuplicateStageOutput = 5007,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Invalid config value
    InvalidConfigValue = 7003,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
    /// Unexpected state
    UnexpectedState = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidJson => "Invalid JSON syntax",
            ErrorCode::UnknownSetType => "Unknown membership set type",
            ErrorCode::MissingShapeField => "Missing membership shape field",
            ErrorCode::InvalidInputArgument => "Invalid input argument",

            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::UnknownSet => "Unknown membership set",
            ErrorCode::NotFuzzified => "Variable not fuzzified",
            ErrorCode::UnknownInput => "Unknown input variable",

            ErrorCode::ValidationError => "Validation error",
            ErrorCode::DuplicateVariable => "Duplicate variable",
            ErrorCode::InvalidDomain => "Invalid domain",
            ErrorCode::InvalidShape => "Invalid membership shape",
            ErrorCode::StageOrder => "Invalid stage order",
            ErrorCode::UnknownOutput => "Unknown output variable",
            ErrorCode::DuplicateStageOutput => "Duplicate stage output",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::UnexpectedState => "Unexpected state",
        }
    }

    /// Process exit status used by the command-line driver
    pub fn exit_status(&self) -> i32 {
        match self.code() {
            1000..=1999 => 65,
            2000..=2999 => 70,
            5000..=5999 => 65,
            7000..=7999 => 78,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for mamdani
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// A rule condition names a variable the registry does not know
    pub fn unknown_variable(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("A non-existing condition variable has been provided: {}", name),
        )
        .with_context("variable", name)
    }

    /// A rule condition names a set its variable does not define
    pub fn unknown_set(variable: &str, set: &str) -> Self {
        Self::new(
            ErrorCode::UnknownSet,
            format!("Set '{}' has not been created for the variable '{}'", set, variable),
        )
        .with_context("variable", variable)
        .with_context("set", set)
    }

    /// A rule reads a variable that holds no degrees in this run
    pub fn not_fuzzified(name: &str) -> Self {
        Self::new(
            ErrorCode::NotFuzzified,
            format!("Input for the {} variable was not fuzzified", name),
        )
        .with_context("variable", name)
    }

    /// An inference call names an input that is not declared
    pub fn unknown_input(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownInput,
            format!("An argument for a non-existing input variable '{}' was provided", name),
        )
        .with_context("variable", name)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Two variables claim the same name
    pub fn duplicate_variable(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateVariable,
            format!("Variable '{}' is declared more than once", name),
        )
        .with_context("variable", name)
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.fields.get(key))
            .map(String::as_str)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzyError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for FuzzyError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        FuzzyError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for FuzzyError {
    fn from(err: serde_json::Error) -> Self {
        FuzzyError::parse(err.to_string())
            .with_code(ErrorCode::InvalidJson)
            .with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for FuzzyError {
    fn from(err: toml::de::Error) -> Self {
        FuzzyError::config(err.to_string())
            .with_code(ErrorCode::InvalidConfigSyntax)
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FuzzyError
pub type FuzzyResult<T> = Result<T, FuzzyError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FuzzyError with context from the current location
#[macro_export]
macro_rules! fuzzy_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FuzzyError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FuzzyError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fuzzy_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fuzzy_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fuzzy_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fuzzy_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FuzzyError::validation("test error");
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn test_unknown_variable_carries_name() {
        let err = FuzzyError::unknown_variable("income");
        assert_eq!(err.code, ErrorCode::UnknownVariable);
        assert_eq!(err.context_field("variable"), Some("income"));
        assert_eq!(err.code.exit_status(), 70);
    }

    #[test]
    fn test_unknown_set_context() {
        let err = FuzzyError::unknown_set("income", "huge");
        assert_eq!(err.context_field("set"), Some("huge"));
        assert!(err.message.contains("huge"));
        assert!(err.message.contains("income"));
    }

    #[test]
    fn test_error_with_cause() {
        let err = FuzzyError::validation("stage failed")
            .with_cause("rule 3")
            .with_cause("unknown set");

        let ctx = err.context.as_ref().unwrap();
        assert_eq!(ctx.causes.len(), 2);
    }

    #[test]
    fn test_error_display() {
        let err = FuzzyError::parse("bad set")
            .at("loan.json")
            .with_cause("missing set_peak_x")
            .with_hint("Triangular sets need a peak");

        let display = err.to_string();
        assert!(display.contains("[1000]"));
        assert!(display.contains("bad set"));
        assert!(display.contains("loan.json"));
        assert!(display.contains("missing set_peak_x"));
        assert!(display.contains("Triangular sets need a peak"));
    }

    #[test]
    fn test_error_to_json() {
        let err = FuzzyError::unknown_input("age");
        let json = err.to_json();
        assert!(json.contains("UNKNOWN_INPUT"));
        assert!(json.contains("age"));
    }

    #[test]
    fn test_exit_status_by_family() {
        assert_eq!(ErrorCode::DuplicateVariable.exit_status(), 65);
        assert_eq!(ErrorCode::InvalidConfigValue.exit_status(), 78);
        assert_eq!(ErrorCode::StageOrder.exit_status(), 65);
        assert_eq!(ErrorCode::NotFuzzified.exit_status(), 70);
    }

    #[test]
    fn test_bail_macro_records_location() {
        fn check(flag: bool) -> FuzzyResult<()> {
            fuzzy_ensure!(flag, ErrorCode::InvalidDomain, "domain {} is reversed", "x");
            Ok(())
        }
        let err = check(false).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDomain);
        assert!(err.context.unwrap().location.unwrap().contains("error.rs"));
        assert!(check(true).is_ok());
    }
}
