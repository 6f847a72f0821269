//! The auth state machine.
//!
//! Pure transitions over [`AuthSnapshot`]; no I/O and no clocks. The context
//! feeds it session-check outcomes, stream events, the hard-ceiling tick and
//! profile results, and runs whatever profile resolution it asks for.
//!
//! # Transitions
//!
//! | input                              | from           | to                                   |
//! |------------------------------------|----------------|--------------------------------------|
//! | session check: session             | loading        | authenticated, default profile       |
//! | session check: none/error/timeout  | loading        | unauthenticated                      |
//! | `SIGNED_OUT` / event w/o session   | any            | unauthenticated                      |
//! | `SIGNED_IN` with session           | any            | authenticated, default profile       |
//! | `TOKEN_REFRESHED` with session     | authenticated  | identity replaced                    |
//! | hard ceiling                       | loading        | unauthenticated                      |
//! | profile result (current epoch)     | authenticated  | profile replaced                     |
//! | owner profile write                | authenticated  | profile replaced, epoch bumped       |
//!
//! Session check outcomes arriving after the status left `loading` are
//! dropped: an event already decided the state.

use studyhub_core::auth::{AuthChange, AuthEvent, AuthSnapshot, AuthStatus, Identity, Session};
use studyhub_core::config::ProfileDefaults;
use studyhub_core::user::{Profile, SignUpDetails};

/// Profile resolution the machine wants run for the current identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRequest {
    /// Epoch the result must match to be applied
    pub epoch: u64,
    pub identity: Identity,
    pub details: Option<SignUpDetails>,
}

#[derive(Debug)]
pub struct AuthMachine {
    snapshot: AuthSnapshot,
    /// Bumped on every identity change, sign-out and owner profile write.
    epoch: u64,
    defaults: ProfileDefaults,
    /// Sign-up form data waiting for the `SIGNED_IN` it belongs to.
    pending_details: Option<SignUpDetails>,
}

impl AuthMachine {
    pub fn new(defaults: ProfileDefaults) -> Self {
        Self {
            snapshot: AuthSnapshot::loading(),
            epoch: 0,
            defaults,
            pending_details: None,
        }
    }

    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.snapshot
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Outcome of the initial session check; `None` covers error and timeout.
    pub fn session_checked(&mut self, session: Option<Session>) -> Option<ProfileRequest> {
        if !self.snapshot.is_loading() {
            return None;
        }
        match session {
            Some(session) => self.authenticate(session.user),
            None => {
                self.sign_out();
                None
            }
        }
    }

    pub fn handle(&mut self, change: AuthChange) -> Option<ProfileRequest> {
        let AuthChange { event, session } = change;
        let Some(session) = session else {
            self.sign_out();
            return None;
        };

        match event {
            AuthEvent::SignedOut => {
                self.sign_out();
                None
            }
            AuthEvent::SignedIn => self.authenticate(session.user),
            AuthEvent::TokenRefreshed => {
                self.refresh_identity(session.user);
                None
            }
            AuthEvent::Other(_) => None,
        }
    }

    /// Forces `Unauthenticated` if the bootstrap never resolved.
    ///
    /// Returns whether the ceiling changed the state.
    pub fn ceiling_elapsed(&mut self) -> bool {
        if !self.snapshot.is_loading() {
            return false;
        }
        self.sign_out();
        true
    }

    /// Applies a resolved profile unless the identity changed since it was requested.
    ///
    /// Returns whether the profile was applied.
    pub fn profile_resolved(&mut self, epoch: u64, profile: Profile) -> bool {
        if epoch != self.epoch || !self.snapshot.is_authenticated() {
            return false;
        }
        self.snapshot.profile = Some(profile);
        self.snapshot.profile_resolved = true;
        true
    }

    /// Applies a profile written by its owner.
    ///
    /// Any resolution still in flight for this identity read an older record
    /// and is invalidated.
    pub fn profile_updated(&mut self, profile: Profile) -> bool {
        let owned = self
            .snapshot
            .identity
            .as_ref()
            .is_some_and(|identity| identity.id == profile.id);
        if !owned || !self.snapshot.is_authenticated() {
            return false;
        }
        self.epoch += 1;
        self.snapshot.profile = Some(profile);
        self.snapshot.profile_resolved = true;
        true
    }

    pub fn stage_sign_up(&mut self, details: SignUpDetails) {
        self.pending_details = Some(details);
    }

    pub fn clear_sign_up(&mut self) {
        self.pending_details = None;
    }

    fn authenticate(&mut self, identity: Identity) -> Option<ProfileRequest> {
        let same_identity = self.snapshot.is_authenticated()
            && self
                .snapshot
                .identity
                .as_ref()
                .is_some_and(|current| current.id == identity.id);
        if same_identity {
            // The resolution already running for this identity stays valid.
            self.snapshot.identity = Some(identity);
            return None;
        }

        self.epoch += 1;
        let details = self.pending_details.take();
        let placeholder = match &details {
            Some(details) => Profile::seeded(&identity, &self.defaults, details),
            None => Profile::fallback(&identity, &self.defaults),
        };
        self.snapshot = AuthSnapshot {
            status: AuthStatus::Authenticated,
            identity: Some(identity.clone()),
            profile: Some(placeholder),
            profile_resolved: false,
        };

        Some(ProfileRequest {
            epoch: self.epoch,
            identity,
            details,
        })
    }

    fn refresh_identity(&mut self, identity: Identity) {
        if self.snapshot.is_authenticated() {
            self.snapshot.identity = Some(identity);
        }
    }

    fn sign_out(&mut self) {
        self.epoch += 1;
        self.snapshot = AuthSnapshot::unauthenticated();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(email: &str) -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "bearer".to_string(),
            expires_at: None,
            user: Identity::new(Uuid::new_v4(), email),
        }
    }

    fn machine() -> AuthMachine {
        AuthMachine::new(ProfileDefaults::default())
    }

    #[test]
    fn test_session_check_authenticates_with_placeholder() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");

        let request = machine.session_checked(Some(session.clone())).unwrap();

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, AuthStatus::Authenticated);
        assert_eq!(snapshot.identity.as_ref(), Some(&session.user));
        assert_eq!(snapshot.profile.as_ref().map(|p| p.name.as_str()), Some("user"));
        assert_eq!(request.epoch, machine.epoch());
        assert_eq!(request.identity, session.user);
    }

    #[test]
    fn test_session_check_without_session_fails_open() {
        let mut machine = machine();
        assert!(machine.session_checked(None).is_none());
        assert_eq!(machine.snapshot(), &AuthSnapshot::unauthenticated());
    }

    #[test]
    fn test_late_session_check_is_dropped() {
        let mut machine = machine();
        machine.handle(AuthChange::signed_out());

        assert!(machine.session_checked(Some(session("late@kpc.or.kr"))).is_none());
        assert_eq!(machine.snapshot().status, AuthStatus::Unauthenticated);
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");

        machine.handle(AuthChange::signed_out());
        machine.handle(AuthChange::signed_in(session.clone()));
        machine.handle(AuthChange::signed_out());
        machine.handle(AuthChange::token_refreshed(session));
        machine.handle(AuthChange::signed_out());
        machine.handle(AuthChange::signed_out());

        assert_eq!(machine.snapshot(), &AuthSnapshot::unauthenticated());
    }

    #[test]
    fn test_event_without_session_signs_out() {
        let mut machine = machine();
        machine.handle(AuthChange::signed_in(session("user@kpc.or.kr")));

        machine.handle(AuthChange::new(AuthEvent::Other("USER_UPDATED".to_string()), None));

        assert_eq!(machine.snapshot(), &AuthSnapshot::unauthenticated());
    }

    #[test]
    fn test_unknown_event_with_session_is_ignored() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");
        machine.handle(AuthChange::signed_in(session.clone()));
        let before = machine.snapshot().clone();

        let request = machine.handle(AuthChange::new(
            AuthEvent::Other("USER_UPDATED".to_string()),
            Some(session),
        ));

        assert!(request.is_none());
        assert_eq!(machine.snapshot(), &before);
    }

    #[test]
    fn test_same_identity_sign_in_does_not_restart_resolution() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");

        let first = machine.session_checked(Some(session.clone()));
        let second = machine.handle(AuthChange::signed_in(session));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(machine.epoch(), first.unwrap().epoch);
    }

    #[test]
    fn test_identity_switch_invalidates_old_profile() {
        let mut machine = machine();
        let alice = session("alice@kpc.or.kr");
        let bob = session("bob@kpc.or.kr");

        let old = machine.handle(AuthChange::signed_in(alice.clone())).unwrap();
        let new = machine.handle(AuthChange::signed_in(bob.clone())).unwrap();

        let alice_profile = Profile::fallback(&alice.user, &ProfileDefaults::default());
        assert!(!machine.profile_resolved(old.epoch, alice_profile));
        assert_eq!(machine.snapshot().profile.as_ref().map(|p| p.id), Some(bob.user.id));

        let mut bob_profile = Profile::fallback(&bob.user, &ProfileDefaults::default());
        bob_profile.bio = Some("remote".to_string());
        assert!(machine.profile_resolved(new.epoch, bob_profile.clone()));
        assert_eq!(machine.snapshot().profile, Some(bob_profile));
    }

    #[test]
    fn test_token_refresh_only_touches_identity() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");
        let request = machine.handle(AuthChange::signed_in(session.clone())).unwrap();
        let mut remote = Profile::fallback(&session.user, &ProfileDefaults::default());
        remote.position = Some("Lead".to_string());
        machine.profile_resolved(request.epoch, remote.clone());

        let mut refreshed = session.clone();
        refreshed.user.email = Some("renamed@kpc.or.kr".to_string());
        assert!(machine.handle(AuthChange::token_refreshed(refreshed.clone())).is_none());

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, AuthStatus::Authenticated);
        assert_eq!(snapshot.identity.as_ref(), Some(&refreshed.user));
        assert_eq!(snapshot.profile, Some(remote));
    }

    #[test]
    fn test_token_refresh_while_loading_is_ignored() {
        let mut machine = machine();
        machine.handle(AuthChange::token_refreshed(session("user@kpc.or.kr")));
        assert!(machine.snapshot().is_loading());
    }

    #[test]
    fn test_ceiling_only_applies_while_loading() {
        let mut stuck = machine();
        assert!(stuck.ceiling_elapsed());
        assert_eq!(stuck.snapshot().status, AuthStatus::Unauthenticated);

        let mut resolved = machine();
        resolved.session_checked(Some(session("user@kpc.or.kr")));
        assert!(!resolved.ceiling_elapsed());
        assert!(resolved.snapshot().is_authenticated());
    }

    #[test]
    fn test_profile_result_after_sign_out_is_discarded() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");
        let request = machine.handle(AuthChange::signed_in(session.clone())).unwrap();
        machine.handle(AuthChange::signed_out());

        let profile = Profile::fallback(&session.user, &ProfileDefaults::default());
        assert!(!machine.profile_resolved(request.epoch, profile));
        assert_eq!(machine.snapshot(), &AuthSnapshot::unauthenticated());
    }

    #[test]
    fn test_staged_sign_up_details_seed_placeholder() {
        let mut machine = machine();
        machine.stage_sign_up(SignUpDetails {
            name: Some("Jung".to_string()),
            ..SignUpDetails::default()
        });

        let request = machine
            .handle(AuthChange::signed_in(session("jung@kpc.or.kr")))
            .unwrap();

        assert_eq!(request.details.as_ref().and_then(|d| d.name.as_deref()), Some("Jung"));
        assert_eq!(
            machine.snapshot().profile.as_ref().map(|p| p.name.as_str()),
            Some("Jung")
        );

        // consumed by the first sign-in
        machine.handle(AuthChange::signed_out());
        let request = machine
            .handle(AuthChange::signed_in(session("next@kpc.or.kr")))
            .unwrap();
        assert!(request.details.is_none());
    }

    #[test]
    fn test_profile_update_requires_owner() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");
        machine.handle(AuthChange::signed_in(session.clone()));

        let stranger = Profile::fallback(
            &Identity::new(Uuid::new_v4(), "other@kpc.or.kr"),
            &ProfileDefaults::default(),
        );
        assert!(!machine.profile_updated(stranger));

        let mut own = Profile::fallback(&session.user, &ProfileDefaults::default());
        own.bio = Some("updated".to_string());
        assert!(machine.profile_updated(own.clone()));
        assert_eq!(machine.snapshot().profile, Some(own));
    }

    #[test]
    fn test_owner_write_invalidates_running_resolution() {
        let mut machine = machine();
        let session = session("user@kpc.or.kr");
        let request = machine.handle(AuthChange::signed_in(session.clone())).unwrap();
        assert!(!machine.snapshot().profile_resolved);

        let mut written = Profile::fallback(&session.user, &ProfileDefaults::default());
        written.position = Some("Lead".to_string());
        assert!(machine.profile_updated(written.clone()));
        assert!(machine.snapshot().is_settled());

        let stale = Profile::fallback(&session.user, &ProfileDefaults::default());
        assert!(!machine.profile_resolved(request.epoch, stale));
        assert_eq!(machine.snapshot().profile, Some(written));
    }

    #[test]
    fn test_settled_tracks_profile_resolution() {
        let mut machine = machine();
        assert!(!machine.snapshot().is_settled());

        let session = session("user@kpc.or.kr");
        let request = machine.session_checked(Some(session.clone())).unwrap();
        assert!(!machine.snapshot().is_settled());

        let placeholder = machine.snapshot().profile.clone().unwrap();
        assert!(machine.profile_resolved(request.epoch, placeholder));
        assert!(machine.snapshot().is_settled());

        machine.handle(AuthChange::signed_out());
        assert!(machine.snapshot().is_settled());
        assert!(!machine.snapshot().profile_resolved);
    }
}
