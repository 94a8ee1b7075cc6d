//! In-process notifications for ledger changes.
//!
//! Two kinds of traffic flow through an [`EventBus`]:
//! - Invalidations: a habit's derived view is stale and should be re-fetched
//! - Sync notifications: speculation, confirmation, retries and failures of
//!   optimistic toggles, plus the pending-queue size
//!
//! Subscriptions have bounded buffers; a subscriber that falls behind is
//! dropped and receives a final [`LedgerEvent::Dropped`] if there is room.
//!
//! # Example
//!
//! ```ignore
//! let bus = EventBus::new();
//! let handle = bus.subscribe(EventConfig {
//!     filter: EventFilter::sync(),
//!     ..Default::default()
//! });
//!
//! while let Ok(event) = handle.recv() {
//!     match event {
//!         LedgerEvent::RetryQueued { pending, .. } => println!("{pending} updates waiting"),
//!         LedgerEvent::Dropped { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{
    AbandonReason, DropReason, EventConfig, EventFilter, LedgerEvent, SubscriptionHandle,
    SubscriptionId,
};
