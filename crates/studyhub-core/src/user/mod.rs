//! User profile domain module.
//!
//! # Module Structure
//!
//! - `model`: profile, partial update and sign-up metadata
//! - `store`: remote profile store trait
//!
//! # Usage
//!
//! ```ignore
//! use studyhub_core::user::{Profile, ProfilePatch, ProfileStore};
//! ```

mod model;
mod store;

// Re-export public API
pub use model::{Profile, ProfilePatch, SignUpDetails};
pub use store::ProfileStore;
