//! Application layer for StudyHub.
//!
//! This crate coordinates the domain traits from `studyhub-core`: the session
//! bootstrap and shared auth state, profile reconciliation, and the feature
//! use cases built on entity tables.

pub mod auth;
pub mod feature;
pub mod profile;

pub use auth::AuthContext;
pub use profile::ProfileReconciler;
