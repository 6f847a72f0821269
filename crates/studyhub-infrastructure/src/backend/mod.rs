//! Hosted backend adapters (auth API and table API).

pub mod auth;
pub mod client;
pub mod profile_store;
pub mod query;
pub mod table;

pub use auth::GoTrueSessionService;
pub use client::BackendClient;
pub use profile_store::PostgrestProfileStore;
pub use table::PostgrestTable;
