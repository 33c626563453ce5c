//! Shared error type across chatline crates.

use thiserror::Error;

/// Coarse error classes (stable, used for logging and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or unknown envelope. Dropped; the connection may continue.
    Protocol,
    /// Login rejected. The connection stays in login negotiation.
    Auth,
    /// Stream closed or broken. Terminal for the affected connection.
    Transport,
    /// Startup or internal failure.
    Internal,
}

impl ErrorClass {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Protocol => "PROTOCOL",
            ErrorClass::Auth => "AUTH",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core, server and client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unknown envelope kind: {0}")]
    UnknownKind(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("username is already taken")]
    NameTaken,
    #[error("invalid username: {0}")]
    InvalidName(&'static str),
    #[error("expected login request")]
    ExpectedLogin,
    #[error("transport: {0}")]
    Transport(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    /// Map the error to its class.
    pub fn class(&self) -> ErrorClass {
        match self {
            ChatError::UnknownKind(_) | ChatError::MalformedPayload(_) => ErrorClass::Protocol,
            ChatError::NameTaken | ChatError::InvalidName(_) | ChatError::ExpectedLogin => {
                ErrorClass::Auth
            }
            ChatError::Transport(_) => ErrorClass::Transport,
            ChatError::Config(_) | ChatError::UnsupportedVersion | ChatError::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }
}
