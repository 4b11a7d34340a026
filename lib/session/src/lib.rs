//! Session lifecycle for reclaim.
//!
//! This crate owns the single source of truth for whether a user is
//! authenticated. The identity provider announces session transitions over
//! an event stream; a single actor task folds those events through the
//! [`SessionState`] transition function and publishes the result over a
//! watch channel. The four imperative operations (sign-in, sign-up,
//! federated sign-in, sign-out) are exposed on [`SessionController`] and
//! resolve independently of the stream-driven transitions.
//!
//! Two properties are load-bearing:
//! - Every state mutation happens on the actor task, one message at a time,
//!   and each transition's side effects (cache invalidation via
//!   [`SessionObserver`]) complete before the next event is taken.
//! - Sign-in is event-driven but sign-out is optimistic: the local state
//!   drops to `Unauthenticated` even if the remote sign-out call fails,
//!   because a stale "signed in" display is the worse failure mode.

pub mod controller;
pub mod observer;
pub mod state;

pub use controller::SessionController;
pub use observer::SessionObserver;
pub use state::{SessionFault, SessionState};
