//! Event and subscription types.

use crate::stats::HabitStats;
use crate::types::HabitId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct EventConfig {
    /// Max buffered events before dropping the subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: EventFilter,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            filter: EventFilter::all(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// Only events about these habits (None = all habits).
    /// Queue-size events carry no habit and always pass.
    pub habit_ids: Option<Vec<HabitId>>,

    /// Include invalidation events.
    pub include_invalidations: bool,

    /// Include sync notifications.
    pub include_sync: bool,
}

impl EventFilter {
    /// Invalidations only.
    pub fn invalidations() -> Self {
        Self {
            include_invalidations: true,
            ..Default::default()
        }
    }

    /// Sync notifications only.
    pub fn sync() -> Self {
        Self {
            include_sync: true,
            ..Default::default()
        }
    }

    /// Everything about the given habits.
    pub fn habits(habit_ids: Vec<HabitId>) -> Self {
        Self {
            habit_ids: Some(habit_ids),
            include_invalidations: true,
            include_sync: true,
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            habit_ids: None,
            include_invalidations: true,
            include_sync: true,
        }
    }

    pub(crate) fn matches(&self, event: &LedgerEvent) -> bool {
        let wanted = match event {
            LedgerEvent::Invalidated { .. } => self.include_invalidations,
            LedgerEvent::Dropped { .. } => true,
            _ => self.include_sync,
        };
        if !wanted {
            return false;
        }

        match (&self.habit_ids, event.habit_id()) {
            (Some(ids), Some(habit_id)) => ids.contains(&habit_id),
            _ => true,
        }
    }
}

/// Events published on an [`EventBus`](super::EventBus).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    // --- View Events ---
    /// The habit's derived view is stale.
    Invalidated { habit_id: HabitId },

    // --- Sync Events ---
    /// A toggle was applied locally ahead of the server.
    Speculated {
        habit_id: HabitId,
        date: NaiveDate,
        completed: bool,
    },

    /// The server answered and the mirror now holds its state.
    Confirmed {
        habit_id: HabitId,
        date: NaiveDate,
        completed: bool,
        stats: HabitStats,
    },

    /// A toggle failed transiently and will be retried automatically.
    RetryQueued {
        habit_id: HabitId,
        date: NaiveDate,
        attempts: u32,
        pending: usize,
    },

    /// A queued toggle was given up on; its speculative state was reverted.
    Abandoned {
        habit_id: HabitId,
        date: NaiveDate,
        reason: AbandonReason,
    },

    /// A toggle failed permanently or was refused before dispatch.
    Rejected {
        habit_id: HabitId,
        date: NaiveDate,
        /// Error kind, e.g. `not_found` or `future_date`.
        kind: String,
        message: String,
    },

    /// Size of the retry queue changed.
    PendingChanged { pending: usize },

    // --- Lifecycle Events ---
    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl LedgerEvent {
    /// The habit the event is about, if any.
    pub fn habit_id(&self) -> Option<HabitId> {
        match self {
            LedgerEvent::Invalidated { habit_id }
            | LedgerEvent::Speculated { habit_id, .. }
            | LedgerEvent::Confirmed { habit_id, .. }
            | LedgerEvent::RetryQueued { habit_id, .. }
            | LedgerEvent::Abandoned { habit_id, .. }
            | LedgerEvent::Rejected { habit_id, .. } => Some(*habit_id),
            LedgerEvent::PendingChanged { .. } | LedgerEvent::Dropped { .. } => None,
        }
    }
}

/// Why a queued toggle was abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    /// Every allowed retry failed.
    RetryLimit,
    /// The date is now after today.
    FutureDate,
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to receive events from a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<LedgerEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<LedgerEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<LedgerEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<LedgerEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything buffered right now, without blocking.
    pub fn drain(&self) -> Vec<LedgerEvent> {
        self.receiver.try_iter().collect()
    }
}
