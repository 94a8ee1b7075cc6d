//! # Habit Ledger
//!
//! A habit tracker's completion ledger: which days each habit was done,
//! the streaks and rates derived from them, and the optimistic client
//! engine that keeps a local copy in step with the server.
//!
//! ## Core Concepts
//!
//! - **Entries**: At most one per (habit, date); presence means completed
//! - **Toggle**: Flip a day's completion by creating or deleting its entry
//! - **Stats**: Current/longest streak, completion rate, total, as of today
//! - **Sync**: Apply toggles locally first, confirm or revert on the answer,
//!   retry transient failures in the background
//!
//! ## Example
//!
//! ```ignore
//! use habit_ledger::*;
//!
//! let service = Arc::new(ToggleService::new(Arc::new(MemoryEntryStore::new())));
//! let me = UserId::new("ana");
//! let habit = service.create_habit(&me, HabitInput::named("Read"))?;
//!
//! // Client side
//! let endpoint = Arc::new(ToggleEndpoint::new(Arc::clone(&service)));
//! let transport = Arc::new(EndpointTransport::new(endpoint, Some(me.clone())));
//! let engine = Arc::new(SyncEngine::new(transport, Arc::new(SystemClock), SyncConfig::default()));
//! engine.init(service.snapshot(&me)?);
//! let _scheduler = engine.start_scheduler()?;
//!
//! let outcome = engine.toggle(habit.id, SystemClock.today())?;
//! println!("done today: {}", outcome.completed());
//! ```

pub mod clock;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod service;
pub mod stats;
pub mod store;
pub mod sync;
pub mod types;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use endpoint::{EndpointResponse, ToggleEndpoint, ToggleRequest};
pub use error::{Result, StoreError, ToggleError};
pub use events::{
    AbandonReason, DropReason, EventBus, EventConfig, EventFilter, LedgerEvent,
    SubscriptionHandle, SubscriptionId,
};
pub use service::{ToggleResponse, ToggleService};
pub use stats::{compute_stats, DayRecord, HabitStats, StatsView};
pub use store::{EntryStore, FileEntryStore, MemoryEntryStore, StoreConfig};
pub use sync::{
    DrainReport, EndpointTransport, EntryRef, MirrorEntry, PendingToggle, RetryScheduler,
    SyncConfig, SyncEngine, ToggleOutcome, ToggleTransport,
};
pub use types::*;
