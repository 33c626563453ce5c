//! Display-name rules shared by the server (login) and the client (input).

use crate::error::{ChatError, Result};

/// Destination sentinel for "every connected peer". Reserved, never a name.
pub const BROADCAST: &str = "ALL";

pub const MAX_USERNAME_CHARS: usize = 32;

/// Check a login candidate and return it trimmed.
pub fn validate_username(candidate: &str) -> Result<&str> {
    let name = candidate.trim();
    if name.is_empty() {
        return Err(ChatError::InvalidName("username must not be empty"));
    }
    if name.chars().count() > MAX_USERNAME_CHARS {
        return Err(ChatError::InvalidName("username is too long"));
    }
    if name.chars().any(char::is_control) {
        return Err(ChatError::InvalidName("username contains control characters"));
    }
    if name == BROADCAST {
        return Err(ChatError::InvalidName("username is reserved"));
    }
    Ok(name)
}
