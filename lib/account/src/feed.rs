//! The entitlement feed task.
//!
//! Recomputes the consumer-facing [`EntitlementView`] whenever the session
//! state or the profile cache changes, and on explicit pokes (a consumer
//! registered a document, so the usage count moved). The feed is the only
//! writer of the view channel.

use reclaim_entitlement::{EntitlementView, Entitlements};
use reclaim_profile::{ProfileCache, ProfileState, ProfileStore};
use reclaim_session::SessionState;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

pub(crate) struct EntitlementFeed {
    state: watch::Receiver<SessionState>,
    revisions: watch::Receiver<u64>,
    pokes: mpsc::Receiver<()>,
    profiles: Arc<ProfileCache>,
    store: Arc<dyn ProfileStore>,
    view: watch::Sender<EntitlementView>,
}

impl EntitlementFeed {
    pub(crate) fn new(
        state: watch::Receiver<SessionState>,
        revisions: watch::Receiver<u64>,
        pokes: mpsc::Receiver<()>,
        profiles: Arc<ProfileCache>,
        store: Arc<dyn ProfileStore>,
        view: watch::Sender<EntitlementView>,
    ) -> Self {
        Self {
            state,
            revisions,
            pokes,
            profiles,
            store,
            view,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            self.refresh().await;
            tokio::select! {
                changed = self.state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                poke = self.pokes.recv() => {
                    if poke.is_none() {
                        break;
                    }
                }
            }
        }
    }

    async fn refresh(&mut self) {
        // Mark both inputs seen before reading, so anything that moves
        // after this point wakes the loop again.
        let snapshot = self.state.borrow_and_update().clone();
        let _ = *self.revisions.borrow_and_update();

        let view = match &snapshot {
            SessionState::Unauthenticated | SessionState::Error { .. } => {
                EntitlementView::unavailable()
            }
            SessionState::Authenticating => EntitlementView::pending(),
            SessionState::Authenticated { identity } => {
                match self.profiles.get(identity.id()) {
                    ProfileState::Pending => EntitlementView::pending(),
                    ProfileState::Failed(err) => {
                        warn!(user = %identity.id(), %err, "entitlements degraded to unavailable");
                        EntitlementView::unavailable()
                    }
                    ProfileState::Ready(profile) => {
                        // Usage is live data; show pending while it loads.
                        self.view.send_replace(EntitlementView::pending());
                        match self.store.fetch_usage_count(identity.id()).await {
                            Ok(usage) => EntitlementView::ready(Entitlements::evaluate(
                                profile.effective_tier(),
                                usage,
                            )),
                            Err(err) => {
                                warn!(
                                    user = %identity.id(), %err,
                                    "usage count unavailable, entitlements degraded"
                                );
                                EntitlementView::unavailable()
                            }
                        }
                    }
                }
            }
        };

        // A session transition observed mid-refresh makes this view stale;
        // the loop recomputes immediately, so drop it instead.
        if *self.state.borrow() != snapshot {
            debug!("session moved during entitlement refresh, discarding view");
            return;
        }
        self.view.send_replace(view);
    }
}
