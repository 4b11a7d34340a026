//! The profile-store adapter surface.

use crate::model::Profile;
use async_trait::async_trait;
use reclaim_core::ProviderUserId;
use std::fmt;

/// Errors from profile-store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStoreError {
    /// No profile row exists for the identity.
    ///
    /// On a first authenticated session this can be the creation race:
    /// the identity provider finished signing the user up before the
    /// profile row landed. The cache retries once for that case.
    NotFound,
    /// The store could not be reached.
    Network {
        /// Transport-level detail.
        message: String,
    },
    /// The store failed in a way it did not classify.
    Store {
        /// Store-supplied detail.
        message: String,
    },
}

impl fmt::Display for ProfileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "profile row not found"),
            Self::Network { message } => write!(f, "profile store unreachable: {message}"),
            Self::Store { message } => write!(f, "profile store error: {message}"),
        }
    }
}

impl std::error::Error for ProfileStoreError {}

/// Operations the remote profile store exposes.
///
/// The store is strongly consistent per row; the usage count is a separate
/// query and may lag the row (eventual consistency across rows), which is
/// why it is fetched on demand and never cached.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile row for an identity.
    async fn fetch_profile(&self, id: &ProviderUserId) -> Result<Profile, ProfileStoreError>;

    /// Replaces the profile row for an identity, returning the stored
    /// record.
    async fn update_profile(
        &self,
        id: &ProviderUserId,
        profile: Profile,
    ) -> Result<Profile, ProfileStoreError>;

    /// Counts the identity's documents in non-terminal status.
    async fn fetch_usage_count(&self, id: &ProviderUserId) -> Result<u32, ProfileStoreError>;
}
