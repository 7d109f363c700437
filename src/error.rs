//! Error types for definition building and packet logging.
//!
//! All errors implement the `std::error::Error` trait and include structured context
//! for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Definition Errors**: Malformed parameter lists handed over by the config parser
//! - **Identity Errors**: Target/packet pairs that are not registered
//! - **Value Errors**: Unknown item names or values that do not fit an item's type
//! - **File Errors**: Problems creating, writing or reading log files
//! - **Parse Errors**: Corrupt or unsupported log file content
//!
//! Redefining a table or packet is not an error. It is reported as a
//! warning string through the caller's warnings collection.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use pktlog::LogError;
//!
//! let error = LogError::unknown_packet("INST", "MISSING");
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packet log operations.
pub type Result<T, E = LogError> = std::result::Result<T, E>;

/// Main error type for packet log operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LogError {
    #[error("{keyword} expects {min}..={max} parameters, found {found}\nUsage: {usage}")]
    InvalidArity { keyword: String, min: usize, max: usize, found: usize, usage: String },

    #[error("Invalid endianness {value}. Must be BIG_ENDIAN or LITTLE_ENDIAN.\nUsage: {usage}")]
    InvalidByteOrder { value: String, usage: String },

    #[error(
        "Invalid display type {value}. Must be ONE_DIMENSIONAL or TWO_DIMENSIONAL.\nUsage: {usage}"
    )]
    InvalidShape { value: String, usage: String },

    #[error("Invalid parameter {value} for {parameter}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },

    #[error("Unknown packet: {target_name} {packet_name}")]
    UnknownPacket { target_name: String, packet_name: String },

    #[error("Item '{field}' not found in {packet}")]
    FieldNotFound { field: String, packet: String },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("Packet log file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Configuration error: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LogError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LogError::File { .. } => true,
            LogError::InvalidArity { .. } => false,
            LogError::InvalidByteOrder { .. } => false,
            LogError::InvalidShape { .. } => false,
            LogError::InvalidParameter { .. } => false,
            LogError::UnknownPacket { .. } => false,
            LogError::FieldNotFound { .. } => false,
            LogError::TypeConversion { .. } => false,
            LogError::Parse { .. } => false,
            LogError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LogError::InvalidArity { .. } => vec![
                "Check the parameter count against the usage string",
                "Quote descriptions that contain whitespace",
            ],
            LogError::InvalidByteOrder { .. } => {
                vec!["Use BIG_ENDIAN or LITTLE_ENDIAN as the byte order keyword"]
            }
            LogError::InvalidShape { .. } => {
                vec!["Use ONE_DIMENSIONAL or TWO_DIMENSIONAL as the display type"]
            }
            LogError::InvalidParameter { .. } => vec![
                "Check numeric parameters such as row counts and bit sizes",
                "Verify the data type keyword is INT, UINT, FLOAT, STRING or BLOCK",
            ],
            LogError::UnknownPacket { .. } => vec![
                "Load the target definitions before constructing writers or readers",
                "Check the target and packet name spelling",
                "Verify command and telemetry namespaces are not mixed up",
            ],
            LogError::FieldNotFound { .. } => vec![
                "Check the item name spelling",
                "Verify the item exists in the loaded packet definition",
            ],
            LogError::TypeConversion { .. } => vec![
                "Check the value literal against the item data type",
                "Verify the value fits in the item bit size",
            ],
            LogError::File { .. } => vec![
                "Check the log directory exists and is writable",
                "Ensure sufficient disk space",
                "Check file permissions",
            ],
            LogError::Parse { .. } => vec![
                "Verify the file is a packet log written by this library",
                "Check the file was not truncated or modified",
            ],
            LogError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Verify every required key is present",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogError::File { path: path.into(), source }
    }

    /// Helper constructor for unknown target/packet pairs.
    pub fn unknown_packet(target_name: impl Into<String>, packet_name: impl Into<String>) -> Self {
        LogError::UnknownPacket {
            target_name: target_name.into(),
            packet_name: packet_name.into(),
        }
    }

    /// Helper constructor for missing items.
    pub fn field_not_found(field: impl Into<String>, packet: impl Into<String>) -> Self {
        LogError::FieldNotFound { field: field.into(), packet: packet.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        LogError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for invalid parameters.
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LogError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LogError::Config { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unknown_packet_message_names_both_identities(
            target in "[A-Z][A-Z0-9_]{0,15}",
            packet in "[A-Z][A-Z0-9_]{0,15}"
        ) {
            let msg = LogError::unknown_packet(target.clone(), packet.clone()).to_string();
            prop_assert!(msg.contains(&target));
            prop_assert!(msg.contains(&packet));
        }

        #[test]
        fn arity_message_carries_usage(
            usage in "[A-Z <>/]{1,40}",
            found in 0usize..10
        ) {
            let err = LogError::InvalidArity {
                keyword: "TABLE".to_string(),
                min: 3,
                max: 5,
                found,
                usage: usage.clone(),
            };
            let msg = err.to_string();
            prop_assert!(msg.contains(&usage));
            prop_assert!(msg.contains(&found.to_string()));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LogError>();

        let error = LogError::unknown_packet("INST", "ADCS");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let file_error = LogError::file_error(
            "/logs/x_tlm.bin",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let unknown = LogError::unknown_packet("INST", "NOPE");

        assert!(file_error.is_retryable());
        assert!(!unknown.is_retryable());

        for suggestion in unknown.recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
        assert!(!file_error.recovery_suggestions().is_empty());
    }

    #[test]
    fn from_io_error_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LogError = io_err.into();
        match err {
            LogError::File { source, .. } => assert_eq!(source.to_string(), "gone"),
            other => panic!("Expected File error, got {:?}", other),
        }
    }
}
