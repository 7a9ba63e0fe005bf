//! Client-side session guard.
//!
//! Keeps a single bearer token, attaches it to outgoing requests through an
//! explicit reqwest-middleware chain, and sends unauthenticated users to the
//! login boundary.

pub mod client;
pub mod config;
pub mod errors;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod notification;
pub mod session;
pub mod store;

pub use client::GuardedClient;
pub use config::GuardConfig;
pub use errors::GuardError;
pub use guard::{PageEvent, PageOutcome, SessionGuard};
pub use session::SessionState;
