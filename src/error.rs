/// Error types for command-use
///
/// Covers the outer layers (storage, recording, config). The record codec
/// itself never errors: malformed persisted values deserialize to `None`.

use thiserror::Error;

/// Main error type for command-use operations
#[derive(Error, Debug)]
pub enum CommandUseError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid command text
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Command contains sensitive data
    #[error("Command contains sensitive data and was not recorded")]
    SensitiveData,

    /// Command exceeds maximum length
    #[error("Command exceeds maximum allowed length of {0} characters")]
    CommandTooLong(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for command-use operations
pub type Result<T> = std::result::Result<T, CommandUseError>;

impl CommandUseError {
    /// Short message suitable for printing to the terminal
    pub fn user_message(&self) -> String {
        match self {
            CommandUseError::Database(e) => {
                format!("History database error. Details: {}", e)
            }
            CommandUseError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            CommandUseError::Serialization(e) => {
                format!("Could not encode command use: {}", e)
            }
            CommandUseError::InvalidCommand(reason) => {
                format!("Invalid command: {}", reason)
            }
            CommandUseError::SensitiveData => {
                "Command contains sensitive data and was not recorded".to_string()
            }
            CommandUseError::CommandTooLong(max) => {
                format!("Command exceeds maximum length of {} characters", max)
            }
            CommandUseError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            CommandUseError::Generic(msg) => msg.clone(),
        }
    }
}
