//! The session state machine.
//!
//! [`SessionState`] is a tagged union with a pure transition function,
//! [`SessionState::apply`]. The actor in [`crate::controller`] is the only
//! writer; everything else folds or observes.

use reclaim_core::Identity;
use reclaim_identity::AuthEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cause of an unrecoverable session error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SessionFault {
    /// The provider event stream closed. Without it no further transitions
    /// can be observed, so the session is dead.
    StreamLost,
}

impl fmt::Display for SessionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamLost => write!(f, "identity provider event stream lost"),
        }
    }
}

/// The authentication state of the client.
///
/// Exactly one value is current at any instant. The actor starts in
/// `Authenticating` (the provider's initial-session check is pending) and
/// moves only in response to stream events or explicit operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No session.
    Unauthenticated,
    /// A session check or sign-in attempt is in flight.
    Authenticating,
    /// A live session for the given identity.
    Authenticated {
        /// The authenticated identity.
        identity: Identity,
    },
    /// The session is unrecoverable.
    Error {
        /// What went wrong.
        fault: SessionFault,
    },
}

impl SessionState {
    /// Folds one stream event into the state.
    ///
    /// The provider is authoritative, so `SignedIn`, `SignedOut`, and
    /// `InitialSession` take effect from any current state. A token refresh
    /// changes nothing.
    #[must_use]
    pub fn apply(&self, event: &AuthEvent) -> Self {
        match event {
            AuthEvent::SignedIn { identity } => Self::Authenticated {
                identity: identity.clone(),
            },
            AuthEvent::InitialSession {
                identity: Some(identity),
            } => Self::Authenticated {
                identity: identity.clone(),
            },
            AuthEvent::InitialSession { identity: None } | AuthEvent::SignedOut => {
                Self::Unauthenticated
            }
            AuthEvent::TokenRefreshed => self.clone(),
        }
    }

    /// Returns true if a session is live.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Returns the authenticated identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }
}
