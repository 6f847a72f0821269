//! Profile resolution for authenticated identities.

mod reconciler;

pub use reconciler::ProfileReconciler;
