//! HTTP surface, signal handling and startup wiring for the `cronwarden` binary.

pub mod reload;
pub mod router;
pub mod signals;
pub mod startup;
pub mod state;

pub use reload::reload_job_set;
pub use router::build_router;
pub use state::AppState;
