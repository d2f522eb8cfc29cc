//! Error taxonomy shared by every command handler.

use crate::converter::ConverterError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors produced while validating or executing a command.
///
/// Every variant is caught at the dispatcher boundary and reported as an
/// `isError` response; none of them terminate the process.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Arguments do not match the command's declared shape.
    #[error("Invalid arguments: {0}")]
    Validation(String),
    /// A referenced element or group does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// A document or diagram could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
    /// Reading or writing a scene file failed.
    #[error("IO error: {0}")]
    Io(String),
    /// A response payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CommandError {
    /// Shorthand for a missing element.
    pub fn element_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Element",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing group.
    pub fn group_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Group",
            id: id.to_string(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Validation(_) => "validation_error",
            CommandError::NotFound { .. } => "not_found",
            CommandError::Parse(_) => "parse_error",
            CommandError::UnknownCommand(_) => "unknown_command",
            CommandError::UnknownResource(_) => "unknown_resource",
            CommandError::Io(_) => "io_error",
            CommandError::Serialization(_) => "serialization_error",
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(_) => CommandError::Validation(err.to_string()),
            other => CommandError::Io(other.to_string()),
        }
    }
}

impl From<ConverterError> for CommandError {
    fn from(err: ConverterError) -> Self {
        CommandError::Parse(format!("Failed to convert diagram: {}", err))
    }
}

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;
