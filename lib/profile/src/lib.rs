//! Profile data for reclaim.
//!
//! The profile store (a remote data store owned by the hosting application)
//! holds one [`Profile`] row per identity plus a live count of the
//! identity's active documents. This crate defines the adapter surface the
//! core consumes ([`ProfileStore`]) and the [`ProfileCache`] that keeps a
//! possibly-stale local copy consistent with the session lifecycle:
//! invalidate-on-event, one in-flight fetch per identity, and a single
//! retry for the profile-creation race on first sign-in.

pub mod cache;
pub mod model;
pub mod store;

pub use cache::{ProfileCache, ProfileError, ProfileState};
pub use model::{Profile, Tier};
pub use store::{ProfileStore, ProfileStoreError};
