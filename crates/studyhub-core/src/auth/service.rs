//! Session service trait.
//!
//! Defines the interface of the hosted auth backend the client consumes.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::model::{AuthChange, Session, SignUpOutcome};
use crate::error::Result;

/// Remote session service: credential issuing plus an auth event stream.
///
/// Implementations own the lifecycle of in-flight requests; callers may stop
/// waiting (by dropping the future) without any further effect.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Returns the current session, if any.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: a usable session
    /// - `Ok(None)`: nobody is signed in
    /// - `Err(_)`: the check itself failed
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Exchanges email and password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Registers a new account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribes to auth state transitions.
    ///
    /// Dropping the receiver releases the subscription.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
