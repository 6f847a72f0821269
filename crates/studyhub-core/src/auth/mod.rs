//! Auth domain module.
//!
//! # Module Structure
//!
//! - `model`: identity, session, status and event types
//! - `service`: the remote session service trait
//!
//! # Usage
//!
//! ```ignore
//! use studyhub_core::auth::{AuthSnapshot, AuthStatus, SessionService};
//! ```

mod model;
mod service;

// Re-export public API
pub use model::{
    AuthChange, AuthEvent, AuthSnapshot, AuthStatus, Identity, Session, SignUpOutcome,
};
pub use service::SessionService;
