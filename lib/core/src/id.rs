//! Strongly-typed identifiers minted by this platform.
//!
//! External identities carry provider-issued ids (see [`crate::identity`]);
//! the ids here are generated locally and use ULID format for uniqueness
//! plus temporal ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing a [`FlowId`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFlowIdError {
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseFlowIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse FlowId: {}", self.reason)
    }
}

impl std::error::Error for ParseFlowIdError {}

/// Unique identifier for an in-progress provider redirect continuation.
///
/// A flow is minted when a redirect-based sign-in is initiated and is the
/// only handle the caller holds while the flow completes out of process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Ulid);

impl FlowId {
    /// Creates a new flow id with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates a flow id from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow_{}", self.0)
    }
}

impl FromStr for FlowId {
    type Err = ParseFlowIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid_str = s.strip_prefix("flow_").unwrap_or(s);
        Ulid::from_str(ulid_str)
            .map(Self)
            .map_err(|e| ParseFlowIdError {
                reason: e.to_string(),
            })
    }
}

impl From<Ulid> for FlowId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}
