//! Queue of toggles waiting to be re-sent.

use super::mirror::MirrorEntry;
use crate::types::{EntryKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A toggle the server has not acknowledged yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingToggle {
    pub key: EntryKey,
    /// Failed background retries. Fresh toggles of a queued key do not
    /// count.
    pub attempts: u32,
    /// Completion state the user last asked for on this key.
    pub desired: bool,
    /// What the mirror held before the first unsynced speculation.
    pub fallback: Option<MirrorEntry>,
    pub queued_at: Timestamp,
}

/// Outcome of recording a failed retry.
#[derive(Debug)]
pub(crate) enum RetryFailure {
    Requeued { attempts: u32 },
    Exhausted(PendingToggle),
    /// Confirmed or removed while the retry was in flight.
    Gone,
}

/// Pending toggles, at most one per key.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    items: BTreeMap<EntryKey, PendingToggle>,
}

impl PendingQueue {
    /// Record a failed fresh toggle. A key already queued only takes the
    /// new `desired`. Returns the key's attempt count.
    pub fn record_failure(
        &mut self,
        key: EntryKey,
        desired: bool,
        fallback: Option<MirrorEntry>,
    ) -> u32 {
        match self.items.get_mut(&key) {
            Some(item) => {
                item.desired = desired;
                item.attempts
            }
            None => {
                self.items.insert(
                    key,
                    PendingToggle {
                        key,
                        attempts: 0,
                        desired,
                        fallback,
                        queued_at: Timestamp::now(),
                    },
                );
                0
            }
        }
    }

    /// Record a failed retry; items reaching `max_retries` are removed.
    pub fn record_retry_failure(&mut self, key: EntryKey, max_retries: u32) -> RetryFailure {
        let Some(item) = self.items.get_mut(&key) else {
            return RetryFailure::Gone;
        };
        item.attempts += 1;
        if item.attempts < max_retries {
            return RetryFailure::Requeued {
                attempts: item.attempts,
            };
        }
        match self.items.remove(&key) {
            Some(item) => RetryFailure::Exhausted(item),
            None => RetryFailure::Gone,
        }
    }

    pub fn get(&self, key: EntryKey) -> Option<PendingToggle> {
        self.items.get(&key).cloned()
    }

    pub fn remove(&mut self, key: EntryKey) -> Option<PendingToggle> {
        self.items.remove(&key)
    }

    pub fn snapshot(&self) -> Vec<PendingToggle> {
        self.items.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
