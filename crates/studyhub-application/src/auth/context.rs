use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use studyhub_core::auth::{
    AuthChange, AuthSnapshot, AuthStatus, Session, SessionService, SignUpOutcome,
};
use studyhub_core::config::AuthSettings;
use studyhub_core::error::{Result, StudyhubError};
use studyhub_core::timeout::with_timeout;
use studyhub_core::user::{Profile, ProfilePatch, ProfileStore, SignUpDetails};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::machine::{AuthMachine, ProfileRequest};
use crate::profile::ProfileReconciler;

/// Owner of the shared `{status, identity, profile}` tuple.
///
/// Constructed once per process and shared by `Arc`. The lifecycle is
/// explicit: [`initialize`](Self::initialize) subscribes to the session
/// service and resolves the bootstrap, [`teardown`](Self::teardown) releases
/// the subscription and turns every later transition into a no-op.
///
/// # Guarantees
///
/// - the status leaves `Loading` within the hard ceiling, whatever the session
///   check does
/// - `Authenticated` is published with a default profile before the stored
///   profile is fetched
/// - profile results for an identity that is no longer current are dropped
///
/// # Thread Safety
///
/// The machine sits behind a `std::sync::Mutex` that is never held across an
/// `.await`; every change is published on a `watch` channel.
pub struct AuthContext {
    sessions: Arc<dyn SessionService>,
    profiles: Arc<dyn ProfileStore>,
    reconciler: Arc<ProfileReconciler>,
    settings: AuthSettings,
    machine: Mutex<AuthMachine>,
    state: watch::Sender<AuthSnapshot>,
    initialized: AtomicBool,
    shutdown: CancellationToken,
}

impl AuthContext {
    pub fn new(
        sessions: Arc<dyn SessionService>,
        profiles: Arc<dyn ProfileStore>,
        reconciler: Arc<ProfileReconciler>,
        settings: AuthSettings,
    ) -> Arc<Self> {
        let machine = AuthMachine::new(reconciler.defaults().clone());
        let (state, _) = watch::channel(machine.snapshot().clone());

        Arc::new(Self {
            sessions,
            profiles,
            reconciler,
            settings,
            machine: Mutex::new(machine),
            state,
            initialized: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        })
    }

    /// Runs the bootstrap: subscribe, arm the hard ceiling, check the session.
    ///
    /// Only the first call does anything; later and concurrent calls return
    /// immediately. Returns once the session check has resolved (profile
    /// resolution continues in the background).
    pub async fn initialize(self: &Arc<Self>) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Auth] Already initialized, skipping");
            return;
        }

        self.spawn_listener(self.sessions.subscribe());
        self.spawn_hard_ceiling();

        let check = with_timeout(
            "session check",
            self.settings.session_timeout(),
            self.sessions.get_session(),
        );
        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => return,
            outcome = check => outcome,
        };

        let session = match outcome {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!("[Auth] Session check failed: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("[Auth] {}", e);
                None
            }
        };

        match &session {
            Some(session) => tracing::info!("[Auth] Session found for {}", session.user.id),
            None => tracing::info!("[Auth] No session, signed out"),
        }

        if let Some(Some(request)) = self.transition(|machine| machine.session_checked(session)) {
            self.spawn_profile_resolution(request);
        }
    }

    /// Releases the event subscription and cancels timers and profile tasks.
    ///
    /// The last published snapshot stays readable.
    pub fn teardown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::debug!("[Auth] Tearing down");
            self.shutdown.cancel();
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Change notifications; the receiver always sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Waits until the bootstrap left `Loading`.
    pub async fn resolved(&self) -> AuthSnapshot {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|snapshot| !snapshot.is_loading()).await {
            Ok(snapshot) => snapshot.clone(),
            // The sender lives as long as `self`.
            Err(_) => self.snapshot(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_member(&self) -> bool {
        self.state.borrow().is_member()
    }

    /// Signs in with email and password.
    ///
    /// Failures are returned as-is and leave the state untouched.
    pub async fn sign_in(self: &Arc<Self>, email: &str, password: &str) -> Result<Session> {
        let session = self.sessions.sign_in_with_password(email, password).await?;
        tracing::info!("[Auth] Signed in as {}", session.user.id);
        self.apply_change(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    /// Registers a new account.
    ///
    /// When the backend returns a session right away, the new identity is
    /// signed in and `details` seed its default profile.
    pub async fn sign_up(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        details: SignUpDetails,
    ) -> Result<SignUpOutcome> {
        self.transition(|machine| machine.stage_sign_up(details));

        let outcome = self.sessions.sign_up(email, password).await;
        if let Ok(SignUpOutcome {
            session: Some(session),
            ..
        }) = &outcome
        {
            self.apply_change(AuthChange::signed_in(session.clone()));
        }
        self.transition(AuthMachine::clear_sign_up);

        let outcome = outcome?;
        if outcome.session.is_none() {
            tracing::info!("[Auth] Signed up {}, awaiting email confirmation", outcome.user.id);
        }
        Ok(outcome)
    }

    /// Signs out remotely, then locally.
    ///
    /// If the remote call fails the local state is kept.
    pub async fn sign_out(self: &Arc<Self>) -> Result<()> {
        self.sessions.sign_out().await?;
        tracing::info!("[Auth] Signed out");
        self.apply_change(AuthChange::signed_out());
        Ok(())
    }

    /// Writes a profile update for the signed-in identity.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Profile> {
        if patch.is_empty() {
            return Err(StudyhubError::validation("profile update has no fields"));
        }
        let identity = match self.snapshot() {
            AuthSnapshot {
                status: AuthStatus::Authenticated,
                identity: Some(identity),
                ..
            } => identity,
            _ => return Err(StudyhubError::auth("not signed in")),
        };

        let profile = self.profiles.update(identity.id, &patch).await?;
        self.transition(|machine| machine.profile_updated(profile.clone()));
        Ok(profile)
    }

    fn apply_change(self: &Arc<Self>, change: AuthChange) {
        tracing::debug!("[Auth] Event {}", change.event);
        if let Some(Some(request)) = self.transition(|machine| machine.handle(change)) {
            self.spawn_profile_resolution(request);
        }
    }

    /// Runs `f` on the machine and publishes the resulting snapshot.
    ///
    /// Returns `None` without touching the machine after teardown.
    fn transition<R>(&self, f: impl FnOnce(&mut AuthMachine) -> R) -> Option<R> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        let mut machine = self.lock_machine();
        let result = f(&mut machine);
        let next = machine.snapshot();
        self.state.send_if_modified(|current| {
            if *current == *next {
                return false;
            }
            *current = next.clone();
            true
        });
        Some(result)
    }

    fn lock_machine(&self) -> MutexGuard<'_, AuthMachine> {
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_listener(self: &Arc<Self>, mut events: broadcast::Receiver<AuthChange>) {
        let context = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = context.shutdown.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(change) => context.apply_change(change),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("[Auth] Event stream lagged, {} events skipped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("[Auth] Event listener stopped");
        });
    }

    fn spawn_hard_ceiling(self: &Arc<Self>) {
        let context = Arc::clone(self);
        let ceiling = self.settings.hard_ceiling();
        tokio::spawn(async move {
            tokio::select! {
                _ = context.shutdown.cancelled() => {}
                _ = tokio::time::sleep(ceiling) => {
                    if let Some(true) = context.transition(AuthMachine::ceiling_elapsed) {
                        tracing::warn!("[Auth] Bootstrap exceeded {:?}, forcing signed out", ceiling);
                    }
                }
            }
        });
    }

    fn spawn_profile_resolution(self: &Arc<Self>, request: ProfileRequest) {
        let context = Arc::clone(self);
        tokio::spawn(async move {
            let ProfileRequest {
                epoch,
                identity,
                details,
            } = request;
            let profile = tokio::select! {
                _ = context.shutdown.cancelled() => return,
                profile = context.reconciler.resolve(&identity, details.as_ref()) => profile,
            };
            if let Some(false) = context.transition(|machine| machine.profile_resolved(epoch, profile)) {
                tracing::debug!("[Profile] Dropped stale profile for {}", identity.id);
            }
        });
    }
}
