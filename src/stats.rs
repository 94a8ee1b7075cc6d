//! Streak and completion statistics.
//!
//! [`compute_stats`] is a pure function of an entry set and "today": it does
//! no I/O and keeps no state between calls. [`StatsView`] layers an LRU
//! cache on top for callers that read stats far more often than habits
//! change, and drops cached values as invalidation events arrive.

use crate::error::ToggleError;
use crate::events::{EventBus, EventConfig, EventFilter, LedgerEvent, SubscriptionHandle};
use crate::service::ToggleService;
use crate::store::EntryStore;
use crate::types::{previous_day, HabitEntry, HabitId, UserId};
use chrono::NaiveDate;
use crossbeam_channel::TryRecvError;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Derived metrics for one habit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    /// Consecutive completed days ending today.
    pub current_streak: u32,
    /// Longest run of consecutive completed days anywhere in history.
    pub longest_streak: u32,
    /// Completed entries over tracked entries, as a rounded percentage.
    pub completion_rate: u32,
    pub total_completions: u32,
}

/// Anything that records whether a habit was done on a given day.
pub trait DayRecord {
    fn day(&self) -> NaiveDate;
    fn is_completed(&self) -> bool;
}

impl DayRecord for HabitEntry {
    fn day(&self) -> NaiveDate {
        self.date
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl DayRecord for (NaiveDate, bool) {
    fn day(&self) -> NaiveDate {
        self.0
    }

    fn is_completed(&self) -> bool {
        self.1
    }
}

impl<T: DayRecord + ?Sized> DayRecord for &T {
    fn day(&self) -> NaiveDate {
        (**self).day()
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}

/// Compute all metrics for an entry set as of `today`.
pub fn compute_stats<I>(entries: I, today: NaiveDate) -> HabitStats
where
    I: IntoIterator,
    I::Item: DayRecord,
{
    let mut tracked: u64 = 0;
    let mut completed: u64 = 0;
    let mut completed_days = BTreeSet::new();

    for entry in entries {
        tracked += 1;
        if entry.is_completed() {
            completed += 1;
            completed_days.insert(entry.day());
        }
    }

    HabitStats {
        current_streak: current_streak(&completed_days, today),
        longest_streak: longest_streak(&completed_days),
        completion_rate: completion_rate(completed, tracked),
        total_completions: saturate(completed),
    }
}

/// Walk back from `today` until the first day without a completion.
fn current_streak(completed_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut day = Some(today);
    while let Some(d) = day {
        if !completed_days.contains(&d) {
            break;
        }
        streak += 1;
        day = previous_day(d);
    }
    streak
}

fn longest_streak(completed_days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    // Newest first: a run continues when the previously seen day is the
    // day right after this one.
    for &day in completed_days.iter().rev() {
        run = match prev {
            Some(p) if previous_day(p) == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

fn completion_rate(completed: u64, tracked: u64) -> u32 {
    if tracked == 0 {
        return 0;
    }
    // Round half up.
    saturate((completed * 200 + tracked) / (tracked * 2)).min(100)
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Default number of habits kept in a [`StatsView`].
const DEFAULT_VIEW_CAPACITY: usize = 256;

/// Cached aggregate view over a [`ToggleService`].
///
/// Holds an invalidation subscription on the service's event bus. Every read
/// first drains that subscription, so a habit toggled since the last read is
/// recomputed instead of served stale.
pub struct StatsView<S: EntryStore> {
    service: Arc<ToggleService<S>>,
    cache: Mutex<LruCache<HabitId, HabitStats>>,
    invalidations: Mutex<SubscriptionHandle>,
}

impl<S: EntryStore> StatsView<S> {
    pub fn new(service: Arc<ToggleService<S>>) -> Self {
        Self::with_capacity(service, DEFAULT_VIEW_CAPACITY)
    }

    pub fn with_capacity(service: Arc<ToggleService<S>>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        let invalidations = subscribe_invalidations(service.events());
        Self {
            service,
            cache: Mutex::new(LruCache::new(capacity)),
            invalidations: Mutex::new(invalidations),
        }
    }

    /// Stats for an owned habit, from cache when still fresh.
    pub fn get(&self, caller: &UserId, habit_id: HabitId) -> Result<HabitStats, ToggleError> {
        self.apply_invalidations();

        if let Some(stats) = self.cache.lock().get(&habit_id).copied() {
            return Ok(stats);
        }

        let stats = self.service.stats(caller, habit_id)?;
        self.cache.lock().put(habit_id, stats);
        Ok(stats)
    }

    /// Drop a habit from the cache.
    pub fn invalidate(&self, habit_id: HabitId) {
        self.cache.lock().pop(&habit_id);
    }

    pub fn cached_len(&self) -> usize {
        self.apply_invalidations();
        self.cache.lock().len()
    }

    fn apply_invalidations(&self) {
        let mut invalidations = self.invalidations.lock();
        loop {
            match invalidations.try_recv() {
                Ok(LedgerEvent::Invalidated { habit_id }) => self.invalidate(habit_id),
                Ok(LedgerEvent::Dropped { .. }) | Err(TryRecvError::Disconnected) => {
                    // Fell behind: anything may be stale.
                    self.cache.lock().clear();
                    *invalidations = subscribe_invalidations(self.service.events());
                    return;
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) => return,
            }
        }
    }
}

fn subscribe_invalidations(events: &EventBus) -> SubscriptionHandle {
    events.subscribe(EventConfig {
        filter: EventFilter::invalidations(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    fn done(days: &[u64]) -> Vec<(NaiveDate, bool)> {
        days.iter().map(|&n| (ago(n), true)).collect()
    }

    #[test]
    fn test_empty_entry_set() {
        let stats = compute_stats(Vec::<(NaiveDate, bool)>::new(), today());
        assert_eq!(stats, HabitStats::default());
    }

    #[test]
    fn test_streak_with_gap_before_run() {
        // Completed on -2, -1, 0; gap on -3; older completions on -4, -5.
        let stats = compute_stats(done(&[0, 1, 2, 4, 5]), today());
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_completions, 5);
        assert_eq!(stats.completion_rate, 100);
    }

    #[test]
    fn test_no_grace_day() {
        let stats = compute_stats(done(&[1, 2, 3]), today());
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn test_longest_streak_in_history() {
        let stats = compute_stats(done(&[0, 10, 11, 12, 13, 20, 21]), today());
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn test_incomplete_entries_count_as_tracked_only() {
        let mut entries = done(&[0, 1]);
        entries.push((ago(2), false));
        entries.push((ago(3), true));

        let stats = compute_stats(&entries, today());
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.total_completions, 3);
        assert_eq!(stats.completion_rate, 75);
    }

    #[test]
    fn test_completion_rate_rounds_half_up() {
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13);
        assert_eq!(completion_rate(0, 4), 0);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn test_unordered_input() {
        let entries = vec![(ago(1), true), (ago(0), true), (ago(2), true)];
        let stats = compute_stats(entries, today());
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(HabitStats {
            current_streak: 1,
            longest_streak: 2,
            completion_rate: 50,
            total_completions: 3,
        })
        .unwrap();
        assert_eq!(json["currentStreak"], 1);
        assert_eq!(json["longestStreak"], 2);
        assert_eq!(json["completionRate"], 50);
        assert_eq!(json["totalCompletions"], 3);
    }

    #[test]
    fn test_view_recovers_after_overflow() {
        use crate::clock::FixedClock;
        use crate::store::MemoryEntryStore;
        use crate::types::HabitInput;

        let service = Arc::new(ToggleService::with_clock(
            Arc::new(MemoryEntryStore::new()),
            Arc::new(FixedClock::new(today())),
        ));
        let owner = UserId::new("ana");
        let habit = service
            .create_habit(&owner, HabitInput::named("Tea"))
            .unwrap()
            .id;
        let view = StatsView::new(Arc::clone(&service));
        assert_eq!(view.get(&owner, habit).unwrap().total_completions, 0);

        // Overflow the view's subscription without reading it.
        for _ in 0..=EventConfig::default().buffer_size {
            service
                .events()
                .publish(LedgerEvent::Invalidated { habit_id: HabitId(999) });
        }
        service.toggle(&owner, habit, today()).unwrap();
        assert_eq!(view.get(&owner, habit).unwrap().total_completions, 1);

        // Subscribed again, so later toggles still invalidate.
        service.toggle(&owner, habit, ago(1)).unwrap();
        assert_eq!(view.get(&owner, habit).unwrap().total_completions, 2);
    }
}
