//! Command Errors
//!
//! Every failure a command can produce. None of them is fatal: the
//! dispatcher turns each into an error reply and the connection stays open.

use crate::protocol::Reply;
use crate::storage::Value;
use thiserror::Error;
use tracing::trace;

/// An error raised while validating or executing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Argument count outside the command's arity
    #[error("ERR wrong number of arguments for '{}' command", .0.to_ascii_lowercase())]
    WrongArity(&'static str),

    /// The key holds a different kind of value
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// An integer argument did not parse or overflowed
    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    /// A score argument did not parse as a float, or was NaN
    #[error("ERR value is not a valid float")]
    NotFloat,

    /// No command is registered under this name
    #[error("CMD NOT FOUND")]
    UnknownCommand(String),
}

impl CommandError {
    /// A `WrongType` error for a key that holds `found` instead of a value of
    /// type `expected`.
    pub fn wrong_type(found: &Value, expected: &'static str) -> Self {
        trace!(found = found.type_name(), expected, "Wrong value type");
        CommandError::WrongType
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CommandError::WrongArity("SET").to_string(),
            "ERR wrong number of arguments for 'set' command"
        );
        assert_eq!(
            CommandError::UnknownCommand("FOO".to_string()).to_string(),
            "CMD NOT FOUND"
        );
    }

    #[test]
    fn test_wrong_type_constructor() {
        let found = Value::Str(bytes::Bytes::from("v"));
        assert_eq!(
            CommandError::wrong_type(&found, "zset"),
            CommandError::WrongType
        );
    }

    #[test]
    fn test_into_reply() {
        let reply: Reply = CommandError::WrongType.into();
        assert_eq!(
            reply.encode(),
            b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"
        );
    }
}
