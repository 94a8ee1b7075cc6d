//! Client-side optimistic sync.
//!
//! [`SyncEngine`] keeps a local mirror of the user's entries, applies each
//! toggle to it immediately and reconciles with the server's answer.
//! Transient failures go to a retry queue drained by [`RetryScheduler`] or
//! [`SyncEngine::retry_now`].

mod engine;
mod mirror;
mod pending;
mod scheduler;
mod transport;

pub use engine::{DrainReport, SyncConfig, SyncEngine, ToggleOutcome};
pub use mirror::{EntryRef, MirrorEntry};
pub use pending::PendingToggle;
pub use scheduler::RetryScheduler;
pub use transport::{EndpointTransport, ToggleTransport};
