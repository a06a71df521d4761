//! Error types for console and server operations.
//!
//! This module defines [`ConsoleError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The `Display` text of every usage and precondition variant is the exact
//!   line the operator sees, so command actions simply propagate with `?`
//! - Use `anyhow::Error` (via `ConsoleError::Other`) for unexpected errors
//! - No error ever escapes a console dispatch; see [`crate::console::Console`]

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cellhost operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A required positional argument was not supplied.
    #[error("missing {field}")]
    MissingArgument { field: &'static str },

    /// A numeric argument did not parse.
    #[error("invalid number for {field}")]
    InvalidNumber { field: &'static str },

    /// The referenced id does not resolve in its registry.
    #[error("no {entity} has this id")]
    NoSuchEntity { entity: &'static str },

    /// The player exists but is not in the alive state.
    #[error("player is not alive")]
    PlayerNotAlive,

    /// The player is not controlled by a human connection.
    #[error("player is a bot")]
    PlayerIsBot,

    /// The player does not belong to any world.
    #[error("player is not in a world")]
    PlayerNotInWorld,

    /// `setting` was invoked without a key.
    #[error("no setting name provided")]
    NoSettingName,

    /// The setting key is not one of the pre-declared keys.
    #[error("no such setting")]
    NoSuchSetting,

    /// The evaluated value does not fit the setting's type.
    #[error("invalid value for setting {key}: {message}")]
    InvalidSettingValue { key: String, message: String },

    /// The server lifecycle has not been started.
    #[error("handle not started")]
    HandleNotStarted,

    /// The server or the ticker is not running.
    #[error("not running")]
    NotRunning,

    /// The ticker is already running.
    #[error("already running")]
    AlreadyRunning,

    /// A lifecycle hook reported failure.
    #[error("failed")]
    LifecycleFailed,

    /// An operator expression could not be parsed or evaluated.
    #[error("{0}")]
    Expression(#[from] crate::console::expr::ExprError),

    /// Settings file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse settings file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for cellhost operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_names_field() {
        let err = ConsoleError::MissingArgument { field: "player id" };
        assert_eq!(err.to_string(), "missing player id");
    }

    #[test]
    fn invalid_number_names_field() {
        let err = ConsoleError::InvalidNumber {
            field: "mass input",
        };
        assert_eq!(err.to_string(), "invalid number for mass input");
    }

    #[test]
    fn no_such_entity_names_entity() {
        let err = ConsoleError::NoSuchEntity { entity: "world" };
        assert_eq!(err.to_string(), "no world has this id");
    }

    #[test]
    fn precondition_messages_are_operator_lines() {
        assert_eq!(ConsoleError::PlayerNotAlive.to_string(), "player is not alive");
        assert_eq!(ConsoleError::PlayerIsBot.to_string(), "player is a bot");
        assert_eq!(
            ConsoleError::PlayerNotInWorld.to_string(),
            "player is not in a world"
        );
        assert_eq!(ConsoleError::LifecycleFailed.to_string(), "failed");
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = ConsoleError::ConfigParseError {
            path: PathBuf::from("/settings.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/settings.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ConsoleError = io_err.into();
        assert!(matches!(err, ConsoleError::Io(_)));
    }
}
