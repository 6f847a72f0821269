//! Auth domain models.
//!
//! Identity, session and the derived client-side status tuple.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::Profile;

/// Sessions this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 10;

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
        }
    }

    /// Local part of the email address (`alice` for `alice@kpc.or.kr`).
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
    }
}

/// A time-bounded credential proving a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether the access token should be refreshed before use.
    ///
    /// A session without expiry metadata never expires client-side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }
}

/// Outcome of a sign-up call.
///
/// Backends that require email confirmation return the user without a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    pub user: Identity,
    #[serde(default)]
    pub session: Option<Session>,
}

/// Client-local tri-state summarizing the bootstrap outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Bootstrap has not resolved yet; protected views must not render.
    #[default]
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Auth state transitions announced by the session service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    /// Any event this client does not react to (`USER_UPDATED`, `INITIAL_SESSION`, ...).
    Other(String),
}

impl AuthEvent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for AuthEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SIGNED_IN" => Self::SignedIn,
            "SIGNED_OUT" => Self::SignedOut,
            "TOKEN_REFRESHED" => Self::TokenRefreshed,
            _ => Self::Other(value),
        }
    }
}

impl From<AuthEvent> for String {
    fn from(value: AuthEvent) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message on the auth event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChange {
    pub event: AuthEvent,
    #[serde(default)]
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(AuthEvent::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEvent::SignedOut, None)
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self::new(AuthEvent::TokenRefreshed, Some(session))
    }
}

/// The shared `{status, identity, profile}` tuple read by every view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    /// `profile` is the reconciled record, not the placeholder shown while
    /// resolution runs.
    #[serde(default)]
    pub profile_resolved: bool,
}

impl AuthSnapshot {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            identity: None,
            profile: None,
            profile_resolved: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// An authenticated identity whose profile is available.
    /// Nothing further will change without a new event: the bootstrap
    /// resolved and, when authenticated, so did the profile.
    pub fn is_settled(&self) -> bool {
        match self.status {
            AuthStatus::Loading => false,
            AuthStatus::Authenticated => self.profile_resolved,
            AuthStatus::Unauthenticated => true,
        }
    }

    pub fn is_member(&self) -> bool {
        self.is_authenticated() && self.profile.is_some()
    }
}
