//! Event bus broadcasting ledger events to subscribers.

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::types::{DropReason, EventConfig, LedgerEvent, SubscriptionHandle, SubscriptionId};

/// Internal subscription state.
struct Subscription {
    config: EventConfig,
    sender: Sender<LedgerEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if the subscriber must be dropped.
    fn try_send(&self, event: LedgerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Manages subscriptions and broadcasts events.
pub struct EventBus {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription.
    pub fn subscribe(&self, config: EventConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Best effort.
            let _ = sub.sender.try_send(LedgerEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Send an event to every matching subscriber. Drops subscribers that
    /// fail to receive.
    pub fn publish(&self, event: LedgerEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if sub.config.filter.matches(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    debug!(subscription = id.0, "dropping slow subscriber");
                    // Might fail if the buffer is still full; that's ok.
                    let _ = sub.sender.try_send(LedgerEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventFilter;
    use crate::types::HabitId;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn speculated(habit: u64) -> LedgerEvent {
        LedgerEvent::Speculated {
            habit_id: HabitId(habit),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            completed: true,
        }
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let bus = EventBus::new();

        let handle = bus.subscribe(EventConfig::default());
        assert_eq!(bus.subscription_count(), 1);

        bus.unsubscribe(handle.id);
        assert_eq!(bus.subscription_count(), 0);

        let last = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(
            last,
            LedgerEvent::Dropped {
                reason: DropReason::Unsubscribed
            }
        );
    }

    #[test]
    fn test_publish_to_matching() {
        let bus = EventBus::new();
        let handle = bus.subscribe(EventConfig {
            filter: EventFilter::habits(vec![HabitId(1)]),
            ..Default::default()
        });

        bus.publish(speculated(2));
        bus.publish(speculated(1));
        bus.publish(LedgerEvent::PendingChanged { pending: 0 });

        let events = handle.drain();
        assert_eq!(
            events,
            vec![speculated(1), LedgerEvent::PendingChanged { pending: 0 }]
        );
    }

    #[test]
    fn test_class_filters() {
        let bus = EventBus::new();
        let invalidations = bus.subscribe(EventConfig {
            filter: EventFilter::invalidations(),
            ..Default::default()
        });
        let sync = bus.subscribe(EventConfig {
            filter: EventFilter::sync(),
            ..Default::default()
        });

        bus.publish(LedgerEvent::Invalidated {
            habit_id: HabitId(4),
        });
        bus.publish(speculated(4));

        assert_eq!(
            invalidations.drain(),
            vec![LedgerEvent::Invalidated {
                habit_id: HabitId(4)
            }]
        );
        assert_eq!(sync.drain(), vec![speculated(4)]);
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let bus = EventBus::new();
        let _handle = bus.subscribe(EventConfig {
            buffer_size: 2,
            ..Default::default()
        });

        for i in 0..10 {
            bus.publish(speculated(i));
        }

        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(LedgerEvent::PendingChanged { pending: 2 }).unwrap();
        assert_eq!(json["type"], "pending_changed");
        assert_eq!(json["pending"], 2);
    }
}
