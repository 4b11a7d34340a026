//! Session-transition events emitted by the identity provider.

use reclaim_core::Identity;
use serde::{Deserialize, Serialize};

/// A session-transition event.
///
/// Events arrive strictly in provider order. The provider is authoritative:
/// the session core folds these into its state without second-guessing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A session was established for the given identity.
    SignedIn {
        /// The authenticated identity.
        identity: Identity,
    },
    /// The current session ended.
    SignedOut,
    /// The provider's answer to the initial "is anyone signed in?" check
    /// performed at subscription time.
    InitialSession {
        /// The restored identity, if a persisted session was found.
        identity: Option<Identity>,
    },
    /// The session's tokens were rotated. The identity and session are
    /// unchanged.
    TokenRefreshed,
}
