//! [`SessionService`] over the hosted auth API.
//!
//! Keeps the current session in memory and in a [`SessionStorage`], refreshes
//! it when it has expired, and announces every transition on a broadcast
//! channel.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use studyhub_core::auth::{AuthChange, Identity, Session, SessionService, SignUpOutcome};
use studyhub_core::error::{Result, StudyhubError};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::client::{BackendClient, Target};
use crate::session_storage::SessionStorage;

const EVENT_CAPACITY: usize = 16;

const SESSION_TARGET: Target<'static> = Target {
    entity_type: "session",
    id: "current",
};

/// A refresh that never reached the server leaves the stored session alone.
fn keeps_session_after_refresh_error(error: &StudyhubError) -> bool {
    error.is_transient()
}

/// Logout answered with a revoked or unknown token.
fn is_stale_token_error(error: &StudyhubError) -> bool {
    error.is_permission() || error.is_not_found()
}

#[derive(Debug, Clone, Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserResponse> for Identity {
    fn from(user: UserResponse) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserResponse,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Sign-up answers with a full session, or only the user when the address
/// still has to be confirmed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

impl SignUpResponse {
    fn into_outcome(self, now: DateTime<Utc>) -> SignUpOutcome {
        match self {
            Self::Session(token) => {
                let session = token.into_session(now);
                SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            Self::User(user) => SignUpOutcome {
                user: user.into(),
                session: None,
            },
        }
    }
}

pub struct GoTrueSessionService {
    client: Arc<BackendClient>,
    storage: Arc<dyn SessionStorage>,
    events: broadcast::Sender<AuthChange>,
    current: Mutex<Option<Session>>,
}

impl GoTrueSessionService {
    pub fn new(client: Arc<BackendClient>, storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            storage,
            events,
            current: Mutex::new(None),
        }
    }

    fn current(&self) -> Option<Session> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    fn emit(&self, change: AuthChange) {
        tracing::debug!("[Auth] {}", change.event);
        // no subscribers is fine
        let _ = self.events.send(change);
    }

    /// Makes `session` current and persists it.
    async fn adopt(&self, session: &Session) {
        self.set_current(Some(session.clone()));
        if let Err(e) = self.storage.store(session).await {
            tracing::warn!("[Auth] Failed to persist session: {}", e);
        }
    }

    /// Drops the session locally and announces the sign-out.
    async fn forget(&self) {
        self.set_current(None);
        if let Err(e) = self.storage.clear().await {
            tracing::warn!("[Auth] Failed to clear stored session: {}", e);
        }
        self.emit(AuthChange::signed_out());
    }

    async fn token_request(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let url = self.client.auth_url(&format!("token?grant_type={}", grant_type));
        let request = self.client.request(Method::POST, &url).json(&body);
        let token: TokenResponse = self.client.send_json(request, SESSION_TARGET).await?;
        Ok(token.into_session(Utc::now()))
    }

    async fn refresh(&self, session: Session) -> Result<Option<Session>> {
        let Some(refresh_token) = session.refresh_token.clone() else {
            tracing::info!("[Auth] Session expired without refresh token");
            self.forget().await;
            return Ok(None);
        };

        match self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(refreshed) => {
                self.adopt(&refreshed).await;
                self.emit(AuthChange::token_refreshed(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(e) if keeps_session_after_refresh_error(&e) => Err(e),
            Err(e) => {
                tracing::info!("[Auth] Refresh rejected: {}", e);
                self.forget().await;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SessionService for GoTrueSessionService {
    async fn get_session(&self) -> Result<Option<Session>> {
        let session = match self.current() {
            Some(session) => session,
            None => match self.storage.load().await? {
                Some(stored) => {
                    self.set_current(Some(stored.clone()));
                    stored
                }
                None => return Ok(None),
            },
        };

        if session.is_expired(Utc::now()) {
            return self.refresh(session).await;
        }
        Ok(Some(session))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;
        self.adopt(&session).await;
        tracing::info!("[Auth] Signed in as {}", session.user.id);
        self.emit(AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let request = self
            .client
            .request(Method::POST, &self.client.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }));
        let response: SignUpResponse = self.client.send_json(request, SESSION_TARGET).await?;
        let outcome = response.into_outcome(Utc::now());

        if let Some(session) = &outcome.session {
            self.adopt(session).await;
            self.emit(AuthChange::signed_in(session.clone()));
        } else {
            tracing::info!("[Auth] Sign-up for {} awaits confirmation", outcome.user.id);
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.current().is_some() {
            let request = self
                .client
                .request(Method::POST, &self.client.auth_url("logout"));
            match self.client.send(request, SESSION_TARGET).await {
                Ok(_) => {}
                Err(e) if is_stale_token_error(&e) => {
                    tracing::debug!("[Auth] Logout with stale token: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        self.forget().await;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
