//! Hooks for identity-scoped state that must follow session transitions.

use reclaim_core::Identity;

/// Observer invoked by the session actor on the transitions that affect
/// identity-scoped caches.
///
/// Both hooks run inside the actor's event handler, before the next event
/// is taken and before the new state is published, so observers can rely on
/// their effects being visible to any consumer that reacts to the
/// transition.
pub trait SessionObserver: Send + Sync {
    /// A session was established for `identity`. Cached data for that
    /// identity must be dropped so it is refetched, never reused across
    /// sessions.
    fn identity_confirmed(&self, identity: &Identity);

    /// The session ended. All identity-scoped cached data must be dropped.
    fn session_cleared(&self);
}

/// No-op observer for wiring the controller without caches.
impl SessionObserver for () {
    fn identity_confirmed(&self, _identity: &Identity) {}

    fn session_cleared(&self) {}
}
