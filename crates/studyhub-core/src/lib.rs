pub mod auth;
pub mod config;
pub mod error;
pub mod feature;
pub mod repository;
pub mod timeout;
pub mod user;

// Re-export common error type
pub use error::{Result, StudyhubError};
