//! Error types for identity-provider operations.
//!
//! Errors are designed for layered context using rootcause: callers match
//! on the variant for user-facing messaging and attach their own context
//! as the error propagates.

use std::fmt;

/// Errors from identity-provider operations.
///
/// These surface to the caller of the operation that failed; they are never
/// written into the session state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider rejected the supplied credentials.
    InvalidCredentials,
    /// The provider could not be reached.
    Network {
        /// Transport-level detail.
        message: String,
    },
    /// The provider failed in a way it did not classify.
    Provider {
        /// Provider-supplied detail.
        message: String,
    },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Network { message } => write!(f, "identity provider unreachable: {message}"),
            Self::Provider { message } => write!(f, "identity provider error: {message}"),
        }
    }
}

impl std::error::Error for IdentityError {}
