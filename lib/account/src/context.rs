//! The account context: construction, wiring, lifecycle.

use crate::config::AccountConfig;
use crate::feed::EntitlementFeed;
use reclaim_core::Identity;
use reclaim_entitlement::EntitlementView;
use reclaim_identity::{IdentityError, IdentityProvider};
use reclaim_profile::{ProfileCache, ProfileStore};
use reclaim_session::{SessionController, SessionObserver};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Keeps the profile cache consistent with session transitions.
///
/// Runs inside the session actor's handler: the eviction/invalidation is
/// complete before the new state is published, so no consumer can observe
/// a fresh session with a stale cached profile.
struct CacheObserver {
    profiles: Arc<ProfileCache>,
}

impl SessionObserver for CacheObserver {
    fn identity_confirmed(&self, identity: &Identity) {
        self.profiles.invalidate(identity.id());
    }

    fn session_cleared(&self) {
        self.profiles.evict_all();
    }
}

/// The composed account core.
///
/// Owns the session actor and the entitlement feed. One per process,
/// constructed at startup and passed to consumers; nothing here is a
/// global.
pub struct AccountContext {
    session: SessionController,
    profiles: Arc<ProfileCache>,
    entitlements: watch::Receiver<EntitlementView>,
    poke: mpsc::Sender<()>,
    feed: JoinHandle<()>,
}

impl AccountContext {
    /// Subscribes to the identity provider, wires the cache to session
    /// transitions, and starts the entitlement feed.
    pub async fn init(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn ProfileStore>,
        config: AccountConfig,
    ) -> reclaim_core::Result<Self, IdentityError> {
        let profiles = Arc::new(ProfileCache::new(
            Arc::clone(&store),
            config.profile_retry_delay,
        ));
        let observer = Arc::new(CacheObserver {
            profiles: Arc::clone(&profiles),
        });
        let session = SessionController::spawn(provider, observer).await?;

        let (view_tx, view_rx) = watch::channel(EntitlementView::pending());
        let (poke_tx, poke_rx) = mpsc::channel(1);
        let feed = EntitlementFeed::new(
            session.watch(),
            profiles.watch_revision(),
            poke_rx,
            Arc::clone(&profiles),
            store,
            view_tx,
        );

        Ok(Self {
            session,
            profiles,
            entitlements: view_rx,
            poke: poke_tx,
            feed: tokio::spawn(feed.run()),
        })
    }

    /// The session controller.
    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// The profile cache.
    #[must_use]
    pub fn profiles(&self) -> &Arc<ProfileCache> {
        &self.profiles
    }

    /// A receiver observing every entitlement change.
    #[must_use]
    pub fn entitlements(&self) -> watch::Receiver<EntitlementView> {
        self.entitlements.clone()
    }

    /// Requests an entitlement recompute.
    ///
    /// Call after an action that moves the usage count (a document was
    /// registered or released); the feed refetches the count and
    /// republishes the view.
    pub fn refresh_entitlements(&self) {
        // A full queue already implies a refresh is due.
        let _ = self.poke.try_send(());
    }

    /// Stops the session actor and the entitlement feed.
    pub async fn dispose(self) {
        self.session.shutdown().await;
        self.feed.abort();
        let _ = self.feed.await;
    }
}
