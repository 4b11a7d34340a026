//! The identity-provider operations trait.

use crate::error::IdentityError;
use crate::event::AuthEvent;
use async_trait::async_trait;
use reclaim_core::{Email, FlowId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Optional profile hints supplied at sign-up.
///
/// Forwarded to the provider verbatim; the application-level profile row is
/// created by the profile store, not from this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    /// Preferred display name.
    pub display_name: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
}

/// Outcome of a successful sign-up call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider established a session immediately; a `SignedIn` event
    /// will follow on the stream.
    SessionEstablished,
    /// The provider deferred the session (e.g. pending e-mail
    /// confirmation). No transition will occur and the caller must not
    /// assume authentication.
    ConfirmationRequired,
}

/// Continuation reference for a redirect-based sign-in flow.
///
/// The flow completes out of process; the session core learns the outcome
/// from the event stream, not from this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthRedirect {
    /// Opaque handle for this flow.
    pub flow: FlowId,
    /// The URL to send the user to.
    pub authorization_url: String,
}

/// Operations the remote identity provider exposes.
///
/// Implementations are supplied by the hosting application. All session
/// transitions are announced over the subscription channel; the imperative
/// calls report only whether the provider accepted the request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribes to the provider's session-transition events.
    ///
    /// The first event delivered is the provider's `InitialSession` answer.
    /// Events arrive strictly in provider order; dropping the receiver is
    /// the unsubscribe.
    async fn subscribe(&self) -> Result<mpsc::Receiver<AuthEvent>, IdentityError>;

    /// Authenticates with an e-mail address and password.
    ///
    /// On success the session transition arrives via the event stream, not
    /// through this call's return value.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<(), IdentityError>;

    /// Registers a new account.
    async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, IdentityError>;

    /// Initiates a redirect-based sign-in with a federated provider.
    async fn sign_in_with_provider(&self) -> Result<OAuthRedirect, IdentityError>;

    /// Ends the current session at the provider.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}
