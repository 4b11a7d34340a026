//! The session controller and its actor.
//!
//! One spawned task owns the [`SessionState`] watch channel and is the only
//! writer. It consumes two streams in a single loop: session-transition
//! events from the identity provider, and commands from the operation
//! methods. Each message is handled to completion (observer side effects
//! included) before the next is taken, which is what makes the ordering
//! guarantees hold without locks.
//!
//! Operations never block the actor. A sign-in brackets the provider call
//! with `BeginOperation`/`RevertOperation` commands: the optimistic
//! `Authenticating` marker is applied up front, and on failure the previous
//! state is restored, unless a stream event superseded the attempt in the
//! meantime, in which case the stream wins and the revert is discarded.

use crate::observer::SessionObserver;
use crate::state::{SessionFault, SessionState};
use reclaim_core::Email;
use reclaim_identity::{
    AuthEvent, IdentityError, IdentityProvider, OAuthRedirect, SignUpMetadata, SignUpOutcome,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const COMMAND_BUFFER: usize = 16;

/// Commands from the operation methods to the actor.
enum Command {
    /// Record the pre-operation state and apply the optimistic
    /// `Authenticating` marker. Replies with the operation epoch.
    BeginOperation { reply: oneshot::Sender<u64> },
    /// Roll back the operation with the given epoch, unless a stream event
    /// superseded it.
    RevertOperation { epoch: u64 },
    /// Transition to `Unauthenticated` immediately (optimistic sign-out).
    BeginSignOut { reply: oneshot::Sender<()> },
    /// Stop the actor without a state change.
    Shutdown,
}

/// An operation whose optimistic marker has not yet been resolved.
struct PendingOp {
    epoch: u64,
    previous: SessionState,
}

struct Actor {
    state: watch::Sender<SessionState>,
    events: mpsc::Receiver<AuthEvent>,
    commands: mpsc::Receiver<Command>,
    observer: Arc<dyn SessionObserver>,
    pending_op: Option<PendingOp>,
    next_epoch: u64,
}

impl Actor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        self.transition(SessionState::Error {
                            fault: SessionFault::StreamLost,
                        });
                        break;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }
    }

    fn handle_event(&mut self, event: AuthEvent) {
        let current = self.state.borrow().clone();
        let next = current.apply(&event);
        if next == current {
            debug!(?event, "session event absorbed");
            return;
        }
        // The provider is authoritative: a stream-driven transition
        // supersedes any pending optimistic marker.
        self.pending_op = None;
        self.transition(next);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::BeginOperation { reply } => {
                let current = self.state.borrow().clone();
                let epoch = self.next_epoch;
                self.next_epoch += 1;
                // Chained attempts keep the original pre-operation state so
                // a late revert lands somewhere meaningful.
                let previous = match (&self.pending_op, &current) {
                    (Some(op), SessionState::Authenticating) => op.previous.clone(),
                    _ => current.clone(),
                };
                self.pending_op = Some(PendingOp { epoch, previous });
                if current != SessionState::Authenticating {
                    self.transition(SessionState::Authenticating);
                }
                let _ = reply.send(epoch);
            }
            Command::RevertOperation { epoch } => match self.pending_op.take() {
                Some(op) if op.epoch == epoch => {
                    let current = self.state.borrow().clone();
                    if current != op.previous {
                        self.transition(op.previous);
                    }
                }
                other => {
                    self.pending_op = other;
                    debug!(epoch, "operation revert superseded by a stream event");
                }
            },
            Command::BeginSignOut { reply } => {
                self.pending_op = None;
                let current = self.state.borrow().clone();
                if current != SessionState::Unauthenticated {
                    self.transition(SessionState::Unauthenticated);
                }
                let _ = reply.send(());
            }
            // Shutdown is intercepted in `run` before dispatch.
            Command::Shutdown => {}
        }
    }

    /// Applies a transition: side effects first, then publish, so observers'
    /// effects are visible to anything that reacts to the new state.
    fn transition(&mut self, next: SessionState) {
        match &next {
            SessionState::Authenticated { identity } => {
                info!(user = %identity.id(), "session authenticated");
                self.observer.identity_confirmed(identity);
            }
            SessionState::Unauthenticated => {
                info!("session cleared");
                self.observer.session_cleared();
            }
            SessionState::Authenticating => debug!("session check in flight"),
            SessionState::Error { fault } => error!(%fault, "session unrecoverable"),
        }
        self.state.send_replace(next);
    }
}

/// Single source of truth for the session state.
///
/// Construct with [`SessionController::spawn`]; read with
/// [`SessionController::state`] or reactively with
/// [`SessionController::watch`].
pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    actor: JoinHandle<()>,
}

impl SessionController {
    /// Subscribes to the provider's event stream and spawns the actor.
    ///
    /// The initial state is `Authenticating`: the provider's
    /// initial-session answer is pending.
    pub async fn spawn(
        provider: Arc<dyn IdentityProvider>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, IdentityError> {
        let events = provider.subscribe().await?;
        let (state_tx, state_rx) = watch::channel(SessionState::Authenticating);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = Actor {
            state: state_tx,
            events,
            commands: command_rx,
            observer,
            pending_op: None,
            next_epoch: 0,
        };
        Ok(Self {
            provider,
            commands: command_tx,
            state: state_rx,
            actor: tokio::spawn(actor.run()),
        })
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every state transition.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Authenticates with an e-mail address and password.
    ///
    /// Success means the provider accepted the credentials; the transition
    /// to `Authenticated` arrives via the event stream only. On failure the
    /// optimistic `Authenticating` marker is rolled back and the error is
    /// returned for user-facing display.
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<(), IdentityError> {
        let epoch = self.begin_operation().await?;
        match self.provider.sign_in(email, password).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.revert_operation(epoch).await;
                Err(err)
            }
        }
    }

    /// Registers a new account.
    ///
    /// Providers that defer the session to e-mail confirmation return
    /// [`SignUpOutcome::ConfirmationRequired`]; no transition will occur,
    /// so the optimistic marker is rolled back the same way as a failure.
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, IdentityError> {
        let epoch = self.begin_operation().await?;
        match self.provider.sign_up(email, password, metadata).await {
            Ok(SignUpOutcome::SessionEstablished) => Ok(SignUpOutcome::SessionEstablished),
            Ok(SignUpOutcome::ConfirmationRequired) => {
                self.revert_operation(epoch).await;
                Ok(SignUpOutcome::ConfirmationRequired)
            }
            Err(err) => {
                self.revert_operation(epoch).await;
                Err(err)
            }
        }
    }

    /// Initiates a redirect-based sign-in with a federated provider.
    ///
    /// On success the state remains `Authenticating` until the redirect
    /// completes out of process and the provider announces the session on
    /// the stream.
    pub async fn sign_in_with_provider(&self) -> Result<OAuthRedirect, IdentityError> {
        let epoch = self.begin_operation().await?;
        match self.provider.sign_in_with_provider().await {
            Ok(redirect) => Ok(redirect),
            Err(err) => {
                self.revert_operation(epoch).await;
                Err(err)
            }
        }
    }

    /// Signs out.
    ///
    /// The local state transitions to `Unauthenticated` before the remote
    /// call is made; a remote failure is returned to the caller but never
    /// leaves the UI falsely authenticated.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let (reply, ack) = oneshot::channel();
        self.commands
            .send(Command::BeginSignOut { reply })
            .await
            .map_err(|_| actor_gone())?;
        ack.await.map_err(|_| actor_gone())?;
        self.provider.sign_out().await
    }

    /// Stops the actor. The final state is left as-is.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.actor.await;
    }

    async fn begin_operation(&self) -> Result<u64, IdentityError> {
        let (reply, epoch) = oneshot::channel();
        self.commands
            .send(Command::BeginOperation { reply })
            .await
            .map_err(|_| actor_gone())?;
        epoch.await.map_err(|_| actor_gone())
    }

    async fn revert_operation(&self, epoch: u64) {
        let _ = self.commands.send(Command::RevertOperation { epoch }).await;
    }
}

fn actor_gone() -> IdentityError {
    IdentityError::Provider {
        message: "session actor stopped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reclaim_core::{FlowId, Identity, ProviderUserId};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    /// Provider double: events are pushed by the test through a channel,
    /// operation results are scripted per call.
    struct ScriptedProvider {
        events: Mutex<Option<mpsc::Receiver<AuthEvent>>>,
        sign_in_results: Mutex<VecDeque<Result<(), IdentityError>>>,
        sign_in_gate: Mutex<Option<oneshot::Receiver<()>>>,
        sign_up_results: Mutex<VecDeque<Result<SignUpOutcome, IdentityError>>>,
        redirect_results: Mutex<VecDeque<Result<OAuthRedirect, IdentityError>>>,
        sign_out_results: Mutex<VecDeque<Result<(), IdentityError>>>,
    }

    impl ScriptedProvider {
        fn new() -> (Arc<Self>, mpsc::Sender<AuthEvent>) {
            let (events_tx, events_rx) = mpsc::channel(16);
            let provider = Arc::new(Self {
                events: Mutex::new(Some(events_rx)),
                sign_in_results: Mutex::new(VecDeque::new()),
                sign_in_gate: Mutex::new(None),
                sign_up_results: Mutex::new(VecDeque::new()),
                redirect_results: Mutex::new(VecDeque::new()),
                sign_out_results: Mutex::new(VecDeque::new()),
            });
            (provider, events_tx)
        }

        fn script_sign_in(&self, result: Result<(), IdentityError>) {
            self.sign_in_results.lock().unwrap().push_back(result);
        }

        fn gate_sign_in(&self, gate: oneshot::Receiver<()>) {
            *self.sign_in_gate.lock().unwrap() = Some(gate);
        }

        fn script_sign_up(&self, result: Result<SignUpOutcome, IdentityError>) {
            self.sign_up_results.lock().unwrap().push_back(result);
        }

        fn script_redirect(&self, result: Result<OAuthRedirect, IdentityError>) {
            self.redirect_results.lock().unwrap().push_back(result);
        }

        fn script_sign_out(&self, result: Result<(), IdentityError>) {
            self.sign_out_results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl IdentityProvider for ScriptedProvider {
        async fn subscribe(&self) -> Result<mpsc::Receiver<AuthEvent>, IdentityError> {
            self.events
                .lock()
                .unwrap()
                .take()
                .ok_or(IdentityError::Provider {
                    message: "already subscribed".to_string(),
                })
        }

        async fn sign_in(&self, _email: &Email, _password: &str) -> Result<(), IdentityError> {
            let gate = self.sign_in_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.sign_in_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }

        async fn sign_up(
            &self,
            _email: &Email,
            _password: &str,
            _metadata: SignUpMetadata,
        ) -> Result<SignUpOutcome, IdentityError> {
            self.sign_up_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SignUpOutcome::SessionEstablished))
        }

        async fn sign_in_with_provider(&self) -> Result<OAuthRedirect, IdentityError> {
            self.redirect_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(OAuthRedirect {
                        flow: FlowId::new(),
                        authorization_url: "https://id.example.com/authorize".to_string(),
                    })
                })
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            self.sign_out_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        confirmed: Mutex<Vec<ProviderUserId>>,
        cleared: AtomicUsize,
    }

    impl SessionObserver for RecordingObserver {
        fn identity_confirmed(&self, identity: &Identity) {
            self.confirmed.lock().unwrap().push(identity.id().clone());
        }

        fn session_cleared(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn identity(id: &str) -> Identity {
        Identity::new(id.into(), format!("{id}@example.com").into())
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionState>,
        pred: impl FnMut(&SessionState) -> bool,
    ) -> SessionState {
        timeout(Duration::from_secs(1), rx.wait_for(pred))
            .await
            .expect("timed out waiting for session state")
            .expect("session watch closed")
            .clone()
    }

    async fn spawn_controller() -> (
        Arc<SessionController>,
        mpsc::Sender<AuthEvent>,
        Arc<ScriptedProvider>,
        Arc<RecordingObserver>,
    ) {
        let (provider, events) = ScriptedProvider::new();
        let observer = Arc::new(RecordingObserver::default());
        let controller = SessionController::spawn(
            Arc::clone(&provider) as Arc<dyn IdentityProvider>,
            Arc::clone(&observer) as Arc<dyn SessionObserver>,
        )
        .await
        .unwrap();
        (Arc::new(controller), events, provider, observer)
    }

    #[tokio::test]
    async fn starts_authenticating() {
        let (controller, _events, _provider, _observer) = spawn_controller().await;
        assert_eq!(controller.state(), SessionState::Authenticating);
    }

    #[tokio::test]
    async fn initial_session_without_user_unauthenticates_and_evicts() {
        let (controller, events, _provider, observer) = spawn_controller().await;
        let mut rx = controller.watch();

        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();

        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;
        assert_eq!(observer.cleared.load(Ordering::SeqCst), 1);
        assert!(observer.confirmed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initial_session_with_user_authenticates_and_invalidates() {
        let (controller, events, _provider, observer) = spawn_controller().await;
        let mut rx = controller.watch();

        events
            .send(AuthEvent::InitialSession {
                identity: Some(identity("u1")),
            })
            .await
            .unwrap();

        let state = wait_for(&mut rx, SessionState::is_authenticated).await;
        assert_eq!(state.identity(), Some(&identity("u1")));
        assert_eq!(
            observer.confirmed.lock().unwrap().as_slice(),
            &[ProviderUserId::from("u1")]
        );
    }

    #[tokio::test]
    async fn token_refresh_is_absorbed() {
        let (controller, events, _provider, observer) = spawn_controller().await;
        let mut rx = controller.watch();

        events
            .send(AuthEvent::SignedIn {
                identity: identity("u1"),
            })
            .await
            .unwrap();
        wait_for(&mut rx, SessionState::is_authenticated).await;

        events.send(AuthEvent::TokenRefreshed).await.unwrap();
        events.send(AuthEvent::SignedOut).await.unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        // exactly one confirmation; the refresh triggered nothing
        assert_eq!(observer.confirmed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sign_in_transition_is_event_driven() {
        let (controller, events, provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        provider.script_sign_in(Ok(()));
        controller
            .sign_in(&"u1@example.com".into(), "hunter2")
            .await
            .unwrap();

        // the call succeeded but the stream has not confirmed yet
        assert_eq!(controller.state(), SessionState::Authenticating);

        events
            .send(AuthEvent::SignedIn {
                identity: identity("u1"),
            })
            .await
            .unwrap();
        let state = wait_for(&mut rx, SessionState::is_authenticated).await;
        assert_eq!(state.identity(), Some(&identity("u1")));
    }

    #[tokio::test]
    async fn sign_in_failure_reverts_to_previous_state() {
        let (controller, events, provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        provider.script_sign_in(Err(IdentityError::InvalidCredentials));
        let err = controller
            .sign_in(&"u1@example.com".into(), "wrong")
            .await
            .unwrap_err();

        assert_eq!(err, IdentityError::InvalidCredentials);
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;
    }

    #[tokio::test]
    async fn stream_event_wins_over_operation_revert() {
        let (controller, events, provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        // hold the provider call open until the test releases it
        let (release, gate) = oneshot::channel();
        provider.gate_sign_in(gate);
        provider.script_sign_in(Err(IdentityError::Network {
            message: "timed out".to_string(),
        }));

        let op = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move {
                controller
                    .sign_in(&"u1@example.com".into(), "hunter2")
                    .await
            })
        };
        wait_for(&mut rx, |s| *s == SessionState::Authenticating).await;

        // the session is confirmed on the stream while the call hangs
        events
            .send(AuthEvent::SignedIn {
                identity: identity("u1"),
            })
            .await
            .unwrap();
        wait_for(&mut rx, SessionState::is_authenticated).await;

        // the late failure must not clobber the confirmed session
        release.send(()).unwrap();
        let result = op.await.unwrap();
        assert!(result.is_err());
        assert_eq!(controller.state().identity(), Some(&identity("u1")));
    }

    #[tokio::test]
    async fn sign_up_confirmation_required_rolls_back_marker() {
        let (controller, events, provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        provider.script_sign_up(Ok(SignUpOutcome::ConfirmationRequired));
        let outcome = controller
            .sign_up(
                &"new@example.com".into(),
                "hunter2",
                SignUpMetadata::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;
    }

    #[tokio::test]
    async fn provider_sign_in_keeps_authenticating_until_redirect_completes() {
        let (controller, events, _provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        let redirect = controller.sign_in_with_provider().await.unwrap();
        assert!(redirect.authorization_url.starts_with("https://"));
        assert_eq!(controller.state(), SessionState::Authenticating);

        // redirect completes out of process; the stream confirms
        events
            .send(AuthEvent::SignedIn {
                identity: identity("u1"),
            })
            .await
            .unwrap();
        wait_for(&mut rx, SessionState::is_authenticated).await;
    }

    #[tokio::test]
    async fn provider_sign_in_failure_reverts() {
        let (controller, events, provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::InitialSession { identity: None })
            .await
            .unwrap();
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;

        provider.script_redirect(Err(IdentityError::Provider {
            message: "flow rejected".to_string(),
        }));
        let err = controller.sign_in_with_provider().await.unwrap_err();

        assert!(matches!(err, IdentityError::Provider { .. }));
        wait_for(&mut rx, |s| *s == SessionState::Unauthenticated).await;
    }

    #[tokio::test]
    async fn sign_out_is_optimistic_despite_remote_failure() {
        let (controller, events, provider, observer) = spawn_controller().await;
        let mut rx = controller.watch();
        events
            .send(AuthEvent::SignedIn {
                identity: identity("u1"),
            })
            .await
            .unwrap();
        wait_for(&mut rx, SessionState::is_authenticated).await;

        provider.script_sign_out(Err(IdentityError::Network {
            message: "connection reset".to_string(),
        }));
        let err = controller.sign_out().await.unwrap_err();

        assert!(matches!(err, IdentityError::Network { .. }));
        assert_eq!(controller.state(), SessionState::Unauthenticated);
        assert_eq!(observer.cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_stream_is_an_unrecoverable_error() {
        let (controller, events, _provider, _observer) = spawn_controller().await;
        let mut rx = controller.watch();

        drop(events);

        let state = wait_for(&mut rx, |s| matches!(s, SessionState::Error { .. })).await;
        assert_eq!(
            state,
            SessionState::Error {
                fault: SessionFault::StreamLost,
            }
        );
    }

    #[tokio::test]
    async fn shutdown_stops_the_actor() {
        let (controller, events, _provider, _observer) = spawn_controller().await;
        let controller = Arc::into_inner(controller).unwrap();
        controller.shutdown().await;
        // the actor is gone; the event channel reports closure
        assert!(events.is_closed());
    }
}
