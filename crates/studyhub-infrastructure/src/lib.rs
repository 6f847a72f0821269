pub mod backend;
pub mod config_service;
pub mod paths;
pub mod session_storage;

pub use crate::backend::{BackendClient, GoTrueSessionService, PostgrestProfileStore, PostgrestTable};
pub use crate::config_service::ConfigService;
pub use crate::paths::StudyhubPaths;
pub use crate::session_storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
