//! Session bootstrap and the shared auth state.
//!
//! # Module Structure
//!
//! - `machine`: pure state transitions with the profile epoch
//! - `context`: the lifecycle owner driving the machine from the session
//!   service, timers and profile resolution

mod context;
mod machine;

pub use context::AuthContext;
pub use machine::{AuthMachine, ProfileRequest};
