//! Identity-provider adapter surface for reclaim.
//!
//! The remote identity provider owns sessions: it authenticates users and
//! announces every session transition over an event stream. This crate
//! defines the surface the rest of the platform consumes:
//! - [`IdentityProvider`]: the imperative operations (sign-in, sign-up,
//!   redirect flows, sign-out) plus the event-stream subscription
//! - [`AuthEvent`]: the typed session-transition event
//! - [`IdentityError`]: the provider failure taxonomy
//!
//! Implementations live with the hosting application; tests fake the trait
//! with in-memory channels.

pub mod error;
pub mod event;
pub mod provider;

pub use error::IdentityError;
pub use event::AuthEvent;
pub use provider::{IdentityProvider, OAuthRedirect, SignUpMetadata, SignUpOutcome};
