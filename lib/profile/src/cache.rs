//! Invalidate-on-event profile cache.
//!
//! One slot per identity, at most one in-flight fetch per slot. Slot
//! versions come from a cache-global monotonic counter, so a fetch spawned
//! against version v can never be confused with a slot re-created after an
//! invalidation: the completion handler writes its result only if the slot
//! still carries the version the fetch was started for, and discards it
//! otherwise. There is no cancellation of in-flight fetches; supersession
//! is entirely this write-time check.

use crate::model::Profile;
use crate::store::{ProfileStore, ProfileStoreError};
use reclaim_core::ProviderUserId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Terminal errors attached to a cache slot, distinct from pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The profile row is genuinely missing: the fetch reported no row
    /// twice (once after the creation-race retry).
    NotFound,
    /// The store failed for a reason that is not safe to retry silently.
    Unavailable {
        /// Underlying store error detail.
        message: String,
    },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "profile missing after retry"),
            Self::Unavailable { message } => write!(f, "profile unavailable: {message}"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// What a consumer sees for an identity's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    /// A fetch is in flight.
    Pending,
    /// The most recent resolved profile.
    Ready(Profile),
    /// The fetch failed terminally; consumers can distinguish this from
    /// "still loading".
    Failed(ProfileError),
}

enum SlotEntry {
    Fetching,
    Ready(Profile),
    Failed(ProfileError),
}

struct Slot {
    version: u64,
    entry: SlotEntry,
}

struct CacheInner {
    slots: HashMap<ProviderUserId, Slot>,
    next_version: u64,
}

impl CacheInner {
    fn allocate_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }
}

/// Keyed cache of profile rows, invalidated by session transitions.
///
/// All mutation happens under one mutex, in [`ProfileCache::get`] miss
/// handling and the fetch/update completion writes; session transitions
/// call [`ProfileCache::invalidate`] and [`ProfileCache::evict_all`]
/// through the session observer. Every slot change bumps the revision
/// counter exposed by [`ProfileCache::watch_revision`], which is how
/// derived state knows to recompute.
pub struct ProfileCache {
    store: Arc<dyn ProfileStore>,
    retry_delay: Duration,
    inner: Mutex<CacheInner>,
    revision: watch::Sender<u64>,
}

impl ProfileCache {
    /// Creates a cache over the given store.
    ///
    /// `retry_delay` is how long to wait before the single
    /// creation-race retry when a fetch reports no profile row.
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>, retry_delay: Duration) -> Self {
        Self {
            store,
            retry_delay,
            inner: Mutex::new(CacheInner {
                slots: HashMap::new(),
                next_version: 0,
            }),
            revision: watch::channel(0).0,
        }
    }

    /// Returns the profile state for an identity, starting a fetch on a
    /// miss.
    ///
    /// Concurrent calls for the same identity share the one outstanding
    /// fetch. Must be called from within a tokio runtime.
    pub fn get(self: &Arc<Self>, id: &ProviderUserId) -> ProfileState {
        let mut inner = self.lock();
        if let Some(slot) = inner.slots.get(id) {
            return match &slot.entry {
                SlotEntry::Fetching => ProfileState::Pending,
                SlotEntry::Ready(profile) => ProfileState::Ready(profile.clone()),
                SlotEntry::Failed(err) => ProfileState::Failed(err.clone()),
            };
        }

        let version = inner.allocate_version();
        inner.slots.insert(
            id.clone(),
            Slot {
                version,
                entry: SlotEntry::Fetching,
            },
        );
        drop(inner);

        let cache = Arc::clone(self);
        let id = id.clone();
        tokio::spawn(async move { cache.run_fetch(id, version).await });
        ProfileState::Pending
    }

    /// Drops the cached value and orphans any in-flight fetch for the
    /// identity. The next [`ProfileCache::get`] starts a fresh fetch.
    pub fn invalidate(&self, id: &ProviderUserId) {
        let removed = self.lock().slots.remove(id).is_some();
        if removed {
            debug!(user = %id, "profile cache slot invalidated");
            self.bump_revision();
        }
    }

    /// Drops every slot. Used when the session ends.
    pub fn evict_all(&self) {
        let mut inner = self.lock();
        if inner.slots.is_empty() {
            return;
        }
        inner.slots.clear();
        drop(inner);
        debug!("profile cache evicted");
        self.bump_revision();
    }

    /// Write-through update: the store is updated first, then the cached
    /// slot is refreshed with the stored record, unless an invalidation
    /// intervened while the call was in flight.
    pub async fn update(
        self: &Arc<Self>,
        id: &ProviderUserId,
        profile: Profile,
    ) -> Result<Profile, ProfileStoreError> {
        let version_before = self.lock().slots.get(id).map(|slot| slot.version);
        let updated = self.store.update_profile(id, profile).await?;

        let mut inner = self.lock();
        let wrote = match (version_before, inner.slots.get_mut(id)) {
            (Some(version), Some(slot)) if slot.version == version => {
                slot.entry = SlotEntry::Ready(updated.clone());
                true
            }
            _ => false,
        };
        drop(inner);
        if wrote {
            self.bump_revision();
        } else {
            debug!(user = %id, "cache slot changed during update, skipping write-back");
        }
        Ok(updated)
    }

    /// The current revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// A receiver that observes every slot change.
    #[must_use]
    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn run_fetch(self: Arc<Self>, id: ProviderUserId, version: u64) {
        let outcome = match self.store.fetch_profile(&id).await {
            Ok(profile) => Ok(profile),
            Err(ProfileStoreError::NotFound) => {
                // Likely the creation race on a first authenticated
                // session: the provider finished sign-up before the
                // profile row landed. One retry, then the row is treated
                // as genuinely missing.
                warn!(user = %id, "profile row missing, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                match self.store.fetch_profile(&id).await {
                    Ok(profile) => Ok(profile),
                    Err(ProfileStoreError::NotFound) => Err(ProfileError::NotFound),
                    Err(err) => Err(ProfileError::Unavailable {
                        message: err.to_string(),
                    }),
                }
            }
            Err(err) => Err(ProfileError::Unavailable {
                message: err.to_string(),
            }),
        };

        let mut inner = self.lock();
        let Some(slot) = inner.slots.get_mut(&id) else {
            debug!(user = %id, "stale profile fetch discarded (slot gone)");
            return;
        };
        if slot.version != version {
            debug!(user = %id, "stale profile fetch discarded (slot superseded)");
            return;
        }
        slot.entry = match outcome {
            Ok(profile) => SlotEntry::Ready(profile),
            Err(err) => {
                error!(user = %id, %err, "profile fetch failed terminally");
                SlotEntry::Failed(err)
            }
        };
        drop(inner);
        self.bump_revision();
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
