//! Optimistic toggle engine.

use super::mirror::{LocalMirror, MirrorEntry};
use super::pending::{PendingQueue, PendingToggle, RetryFailure};
use super::scheduler::{RetryScheduler, SchedulerCommand};
use super::transport::ToggleTransport;
use crate::clock::Clock;
use crate::endpoint::ToggleRequest;
use crate::error::ToggleError;
use crate::events::{
    AbandonReason, EventBus, EventConfig, EventFilter, LedgerEvent, SubscriptionHandle,
};
use crate::service::ToggleResponse;
use crate::stats::{compute_stats, HabitStats};
use crate::types::{EntryKey, HabitId, HabitSnapshot};
use chrono::NaiveDate;
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sync engine configuration.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Delay between retry drains while toggles are pending.
    /// Default: 30s
    pub retry_period: Duration,

    /// Failed retries after which a pending toggle is abandoned.
    /// Default: 3
    pub max_retries: u32,

    /// Buffer size for subscriptions made through [`SyncEngine::subscribe`].
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_period: Duration::from_secs(30),
            max_retries: 3,
            event_buffer: 1000,
        }
    }
}

/// What a toggle ended in, from the user's point of view.
#[derive(Clone, Debug, PartialEq)]
pub enum ToggleOutcome {
    /// The server answered; the mirror holds its state.
    Confirmed { completed: bool, stats: HabitStats },
    /// The request failed transiently. The speculative state stays visible
    /// and the toggle will be retried.
    Queued { completed: bool, pending: usize },
}

impl ToggleOutcome {
    /// Completion state now shown for the toggled day.
    pub fn completed(&self) -> bool {
        match self {
            ToggleOutcome::Confirmed { completed, .. } | ToggleOutcome::Queued { completed, .. } => {
                *completed
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, ToggleOutcome::Confirmed { .. })
    }
}

/// Counts from one drain of the retry queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub confirmed: usize,
    pub requeued: usize,
    pub abandoned: usize,
    pub rejected: usize,
    /// Left for later because a request for the same key was in flight.
    pub skipped: usize,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.confirmed + self.requeued + self.abandoned + self.rejected
    }
}

/// How the engine treats a failed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposition {
    Retry,
    /// Someone else created the entry first.
    Completed,
    Permanent,
}

impl Disposition {
    fn of(error: &ToggleError) -> Self {
        match error {
            ToggleError::Transient { .. } => Disposition::Retry,
            ToggleError::Conflict { .. } => Disposition::Completed,
            ToggleError::Unauthorized
            | ToggleError::NotFound { .. }
            | ToggleError::FutureDate { .. } => Disposition::Permanent,
        }
    }
}

/// A local mutation applied ahead of the server.
struct Speculation {
    key: EntryKey,
    /// Slot contents before the mutation.
    previous: Option<MirrorEntry>,
    /// Slot contents after it; None when the entry was removed.
    applied: Option<MirrorEntry>,
}

impl Speculation {
    fn desired(&self) -> bool {
        self.applied.is_some()
    }
}

/// Marks a key as having a request in flight until dropped.
struct InFlight<'a> {
    keys: &'a Mutex<HashMap<EntryKey, usize>>,
    key: EntryKey,
}

impl<'a> InFlight<'a> {
    fn enter(keys: &'a Mutex<HashMap<EntryKey, usize>>, key: EntryKey) -> Self {
        *keys.lock().entry(key).or_insert(0) += 1;
        Self { keys, key }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut keys = self.keys.lock();
        if let Some(count) = keys.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                keys.remove(&self.key);
            }
        }
    }
}

/// Client-resident optimistic ledger.
///
/// Holds a mirror of the user's habit entries, applies toggles to it before
/// the server answers, reconciles with the answer, and keeps transiently
/// failed toggles in a bounded retry queue. The mirror is only mutated
/// through the engine.
///
/// Lock order is mirror, then pending. No lock is held while the transport
/// runs.
pub struct SyncEngine {
    config: SyncConfig,
    transport: Arc<dyn ToggleTransport>,
    clock: Arc<dyn Clock>,

    mirror: RwLock<LocalMirror>,
    pending: Mutex<PendingQueue>,
    in_flight: Mutex<HashMap<EntryKey, usize>>,

    events: EventBus,
    next_speculative_id: AtomicU64,

    /// Wakes the retry scheduler when the queue becomes non-empty.
    waker: Mutex<Option<Sender<SchedulerCommand>>>,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn ToggleTransport>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            config,
            transport,
            clock,
            mirror: RwLock::new(LocalMirror::default()),
            pending: Mutex::new(PendingQueue::default()),
            in_flight: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            next_speculative_id: AtomicU64::new(1),
            waker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, filter: EventFilter) -> SubscriptionHandle {
        self.events.subscribe(EventConfig {
            buffer_size: self.config.event_buffer,
            filter,
        })
    }

    // --- Lifecycle ---

    /// Replace the mirror with a server snapshot and forget pending toggles.
    pub fn init(&self, snapshots: Vec<HabitSnapshot>) {
        let habits = snapshots.len();
        *self.mirror.write() = LocalMirror::from_snapshots(snapshots);
        self.clear_pending();
        info!(habits, "initialized mirror");
    }

    /// Empty the mirror and the retry queue.
    pub fn reset(&self) {
        *self.mirror.write() = LocalMirror::default();
        self.clear_pending();
        info!("reset mirror");
    }

    // --- Readers ---

    /// Mirrored entries of a habit, ordered by date.
    pub fn entries(&self, habit_id: HabitId) -> Option<Vec<MirrorEntry>> {
        self.mirror.read().entries(habit_id)
    }

    pub fn is_completed(&self, habit_id: HabitId, date: NaiveDate) -> bool {
        self.mirror
            .read()
            .get(EntryKey::new(habit_id, date))
            .is_some_and(|e| e.completed)
    }

    /// Stats of a mirrored habit as of today, recomputed on every call.
    pub fn stats(&self, habit_id: HabitId) -> Option<HabitStats> {
        let today = self.clock.today();
        let mirror = self.mirror.read();
        let entries = mirror.entries(habit_id)?;
        Some(compute_stats(&entries, today))
    }

    pub fn habit_ids(&self) -> Vec<HabitId> {
        self.mirror.read().habit_ids()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn pending_toggles(&self) -> Vec<PendingToggle> {
        self.pending.lock().snapshot()
    }

    // --- Toggle ---

    /// Toggle completion of `habit_id` on `date`.
    ///
    /// The mirror changes before the request is sent. Transient failures
    /// keep that change and queue the toggle (`Ok(Queued)`); permanent
    /// failures undo it and are returned as errors.
    pub fn toggle(&self, habit_id: HabitId, date: NaiveDate) -> Result<ToggleOutcome, ToggleError> {
        let key = EntryKey::new(habit_id, date);

        let today = self.clock.today();
        if date > today {
            let err = ToggleError::FutureDate { date, today };
            self.publish_rejected(key, &err);
            return Err(err);
        }

        let speculation = self.speculate(key)?;

        match self.dispatch(key) {
            Ok(response) => {
                let completed = response.completed;
                let stats = self.reconcile(key, response);
                Ok(ToggleOutcome::Confirmed { completed, stats })
            }
            Err(e) => match Disposition::of(&e) {
                Disposition::Retry => {
                    warn!(%key, error = %e, "toggle failed, queued for retry");
                    let pending = self.enqueue(&speculation);
                    Ok(ToggleOutcome::Queued {
                        completed: speculation.desired(),
                        pending,
                    })
                }
                Disposition::Completed => {
                    let stats = self.reconcile(key, completed_elsewhere());
                    Ok(ToggleOutcome::Confirmed {
                        completed: true,
                        stats,
                    })
                }
                Disposition::Permanent => {
                    warn!(%key, error = %e, "toggle rejected, reverting");
                    self.revert(&speculation);
                    self.publish_rejected(key, &e);
                    Err(e)
                }
            },
        }
    }

    // --- Retry ---

    /// Re-send every pending toggle now.
    pub fn retry_now(&self) -> DrainReport {
        let today = self.clock.today();
        let queued = self.pending.lock().snapshot();
        let mut report = DrainReport::default();

        for key in queued.into_iter().map(|item| item.key) {
            if self.in_flight.lock().contains_key(&key) {
                debug!(%key, "request in flight, retrying later");
                report.skipped += 1;
                continue;
            }

            // Confirmed since the snapshot was taken, by a fresh toggle or
            // another drain.
            let current = self.pending.lock().get(key);
            let Some(item) = current else {
                continue;
            };

            if key.date > today {
                let removed = self.pending.lock().remove(key);
                if let Some(item) = removed {
                    self.abandon(item, AbandonReason::FutureDate);
                    report.abandoned += 1;
                }
                continue;
            }

            match self.resend(&item) {
                Ok(response) => {
                    self.reconcile(key, response);
                    report.confirmed += 1;
                }
                Err(e) => match Disposition::of(&e) {
                    Disposition::Retry => {
                        let outcome = self
                            .pending
                            .lock()
                            .record_retry_failure(key, self.config.max_retries);
                        match outcome {
                            RetryFailure::Requeued { attempts } => {
                                debug!(%key, attempts, error = %e, "retry failed");
                                self.events.publish(LedgerEvent::RetryQueued {
                                    habit_id: key.habit_id,
                                    date: key.date,
                                    attempts,
                                    pending: self.pending_count(),
                                });
                                report.requeued += 1;
                            }
                            RetryFailure::Exhausted(item) => {
                                self.abandon(item, AbandonReason::RetryLimit);
                                report.abandoned += 1;
                            }
                            RetryFailure::Gone => {}
                        }
                    }
                    Disposition::Completed => {
                        self.reconcile(key, completed_elsewhere());
                        report.confirmed += 1;
                    }
                    Disposition::Permanent => {
                        let removed = self.pending.lock().remove(key);
                        if let Some(item) = removed {
                            self.restore(key, item.fallback);
                            self.publish_pending();
                        }
                        self.publish_rejected(key, &e);
                        report.rejected += 1;
                    }
                },
            }
        }

        if report.attempted() > 0 {
            info!(
                confirmed = report.confirmed,
                requeued = report.requeued,
                abandoned = report.abandoned,
                rejected = report.rejected,
                "drained retry queue"
            );
        }
        report
    }

    /// Send a pending toggle. If the server lands on the opposite of what
    /// the user asked for, an earlier request did get through after all, so
    /// flip once more.
    fn resend(&self, item: &PendingToggle) -> Result<ToggleResponse, ToggleError> {
        let response = self.dispatch(item.key)?;
        if response.completed == item.desired {
            return Ok(response);
        }
        debug!(key = %item.key, "server state opposes intent, sending corrective toggle");
        self.dispatch(item.key)
    }

    // --- Internals ---

    fn speculate(&self, key: EntryKey) -> Result<Speculation, ToggleError> {
        let speculation = {
            let mut mirror = self.mirror.write();
            if mirror.contains_habit(key.habit_id) {
                let previous = mirror.get(key).cloned();
                let applied = match previous {
                    Some(_) => None,
                    None => Some(MirrorEntry::speculative(key, self.next_speculative_id())),
                };
                mirror.set(key, applied.clone());
                Some(Speculation {
                    key,
                    previous,
                    applied,
                })
            } else {
                None
            }
        };

        let Some(speculation) = speculation else {
            let err = ToggleError::NotFound {
                habit_id: key.habit_id,
            };
            self.publish_rejected(key, &err);
            return Err(err);
        };

        debug!(%key, completed = speculation.desired(), "speculated");
        self.events.publish(LedgerEvent::Speculated {
            habit_id: key.habit_id,
            date: key.date,
            completed: speculation.desired(),
        });
        Ok(speculation)
    }

    fn dispatch(&self, key: EntryKey) -> Result<ToggleResponse, ToggleError> {
        let _in_flight = InFlight::enter(&self.in_flight, key);
        self.transport
            .send_toggle(&ToggleRequest::new(key.habit_id, key.date))
    }

    /// Make the mirror hold the server's answer for `key`.
    fn reconcile(&self, key: EntryKey, response: ToggleResponse) -> HabitStats {
        {
            let mut mirror = self.mirror.write();
            let next = if response.completed {
                match response.entry {
                    Some(entry) => Some(MirrorEntry::from(entry)),
                    None => match mirror.get(key) {
                        Some(current) => Some(MirrorEntry {
                            completed: true,
                            ..current.clone()
                        }),
                        None => Some(MirrorEntry::speculative(key, self.next_speculative_id())),
                    },
                }
            } else {
                None
            };
            mirror.set(key, next);
        }

        let cleared = self.pending.lock().remove(key).is_some();
        let stats = self.stats(key.habit_id).unwrap_or_default();

        debug!(%key, completed = response.completed, "confirmed");
        self.events.publish(LedgerEvent::Confirmed {
            habit_id: key.habit_id,
            date: key.date,
            completed: response.completed,
            stats,
        });
        if cleared {
            self.publish_pending();
        }
        self.events.publish(LedgerEvent::Invalidated {
            habit_id: key.habit_id,
        });
        stats
    }

    /// Undo a speculation, unless something newer already replaced it.
    fn revert(&self, speculation: &Speculation) {
        let mut mirror = self.mirror.write();
        let untouched = match (&speculation.applied, mirror.get(speculation.key)) {
            (Some(applied), Some(current)) => applied.id == current.id,
            (None, None) => true,
            _ => false,
        };
        if untouched {
            mirror.set(speculation.key, speculation.previous.clone());
        }
    }

    fn restore(&self, key: EntryKey, fallback: Option<MirrorEntry>) {
        self.mirror.write().set(key, fallback);
    }

    fn enqueue(&self, speculation: &Speculation) -> usize {
        let (attempts, pending) = {
            let mut queue = self.pending.lock();
            let attempts = queue.record_failure(
                speculation.key,
                speculation.desired(),
                speculation.previous.clone(),
            );
            (attempts, queue.len())
        };

        self.events.publish(LedgerEvent::RetryQueued {
            habit_id: speculation.key.habit_id,
            date: speculation.key.date,
            attempts,
            pending,
        });
        self.events.publish(LedgerEvent::PendingChanged { pending });
        self.wake_scheduler();
        pending
    }

    fn abandon(&self, item: PendingToggle, reason: AbandonReason) {
        warn!(key = %item.key, attempts = item.attempts, ?reason, "abandoning toggle");
        self.restore(item.key, item.fallback);
        self.events.publish(LedgerEvent::Abandoned {
            habit_id: item.key.habit_id,
            date: item.key.date,
            reason,
        });
        self.publish_pending();
    }

    fn clear_pending(&self) {
        let had_pending = {
            let mut queue = self.pending.lock();
            let had = queue.len() > 0;
            queue.clear();
            had
        };
        if had_pending {
            self.publish_pending();
        }
    }

    fn publish_pending(&self) {
        let pending = self.pending_count();
        self.events.publish(LedgerEvent::PendingChanged { pending });
    }

    fn publish_rejected(&self, key: EntryKey, error: &ToggleError) {
        self.events.publish(LedgerEvent::Rejected {
            habit_id: key.habit_id,
            date: key.date,
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    fn next_speculative_id(&self) -> u64 {
        self.next_speculative_id.fetch_add(1, Ordering::Relaxed)
    }

    // --- Scheduler plumbing ---

    /// Start a background thread that drains the retry queue every
    /// `retry_period` while toggles are pending.
    pub fn start_scheduler(self: &Arc<Self>) -> std::io::Result<RetryScheduler> {
        RetryScheduler::start(Arc::clone(self))
    }

    pub(crate) fn set_waker(&self, waker: Option<Sender<SchedulerCommand>>) {
        *self.waker.lock() = waker;
    }

    fn wake_scheduler(&self) {
        if let Some(waker) = self.waker.lock().as_ref() {
            // The scheduler may already be gone.
            let _ = waker.send(SchedulerCommand::Wake);
        }
    }
}

/// Stand-in answer for a create that lost to a concurrent one.
fn completed_elsewhere() -> ToggleResponse {
    ToggleResponse {
        completed: true,
        entry: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::types::{EntryId, HabitEntry, Timestamp};
    use std::collections::VecDeque;

    /// Answers from a script, then flips a local set like a server would.
    #[derive(Default)]
    struct ScriptedTransport {
        failures: Mutex<VecDeque<ToggleError>>,
        completed: Mutex<std::collections::HashSet<EntryKey>>,
        calls: AtomicU64,
        /// Runs inside the next call, before it is answered.
        during_next_call: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl ScriptedTransport {
        fn fail_next(&self, error: ToggleError) {
            self.failures.lock().push_back(error);
        }
    }

    impl ToggleTransport for ScriptedTransport {
        fn send_toggle(&self, request: &ToggleRequest) -> Result<ToggleResponse, ToggleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let during = self.during_next_call.lock().take();
            if let Some(during) = during {
                during();
            }
            if let Some(err) = self.failures.lock().pop_front() {
                return Err(err);
            }
            let date = crate::types::parse_day(&request.date).unwrap();
            let key = EntryKey::new(request.habit_id, date);
            let mut completed = self.completed.lock();
            if completed.remove(&key) {
                return Ok(ToggleResponse {
                    completed: false,
                    entry: None,
                });
            }
            completed.insert(key);
            let now = Timestamp::now();
            Ok(ToggleResponse {
                completed: true,
                entry: Some(HabitEntry {
                    id: EntryId(100),
                    habit_id: request.habit_id,
                    date,
                    completed: true,
                    created_at: now,
                    updated_at: now,
                }),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 10).unwrap()
    }

    fn engine() -> (SyncEngine, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let engine = SyncEngine::new(
            transport.clone(),
            Arc::new(FixedClock::new(today())),
            SyncConfig::default(),
        );
        engine.init(vec![HabitSnapshot {
            habit_id: HabitId(1),
            entries: vec![],
        }]);
        (engine, transport)
    }

    #[test]
    fn test_confirmed_toggle_replaces_speculative_entry() {
        let (engine, _transport) = engine();
        let outcome = engine.toggle(HabitId(1), today()).unwrap();

        assert!(outcome.is_confirmed());
        let entries = engine.entries(HabitId(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_speculative());
    }

    #[test]
    fn test_future_date_never_dispatched() {
        let (engine, transport) = engine();
        let tomorrow = today().succ_opt().unwrap();

        let result = engine.toggle(HabitId(1), tomorrow);
        assert!(matches!(result, Err(ToggleError::FutureDate { .. })));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(engine.entries(HabitId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_habit_rejected_locally() {
        let (engine, transport) = engine();
        let result = engine.toggle(HabitId(9), today());
        assert_eq!(
            result,
            Err(ToggleError::NotFound {
                habit_id: HabitId(9)
            })
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_permanent_failure_reverts() {
        let (engine, transport) = engine();
        transport.fail_next(ToggleError::Unauthorized);

        let result = engine.toggle(HabitId(1), today());
        assert_eq!(result, Err(ToggleError::Unauthorized));
        assert!(!engine.is_completed(HabitId(1), today()));
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_conflict_counts_as_completed() {
        let (engine, transport) = engine();
        transport.fail_next(ToggleError::Conflict {
            habit_id: HabitId(1),
            date: today(),
        });

        let outcome = engine.toggle(HabitId(1), today()).unwrap();
        assert!(outcome.completed());
        assert!(engine.is_completed(HabitId(1), today()));
    }

    #[test]
    fn test_transient_failure_keeps_speculation() {
        let (engine, transport) = engine();
        transport.fail_next(ToggleError::transient("timeout"));

        let outcome = engine.toggle(HabitId(1), today()).unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Queued {
                completed: true,
                pending: 1
            }
        );
        assert!(engine.is_completed(HabitId(1), today()));
        assert!(engine.entries(HabitId(1)).unwrap()[0].is_speculative());
    }

    #[test]
    fn test_resend_corrects_overshoot() {
        let (engine, transport) = engine();
        transport.fail_next(ToggleError::transient("timeout"));
        engine.toggle(HabitId(1), today()).unwrap();

        // The timed-out request actually reached the server.
        transport
            .completed
            .lock()
            .insert(EntryKey::new(HabitId(1), today()));

        let report = engine.retry_now();
        assert_eq!(report.confirmed, 1);
        assert!(engine.is_completed(HabitId(1), today()));
        assert!(transport
            .completed
            .lock()
            .contains(&EntryKey::new(HabitId(1), today())));
        // Initial call, the retry that overshot, and the correction.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_drain_skips_items_confirmed_meanwhile() {
        let transport = Arc::new(ScriptedTransport::default());
        let engine = Arc::new(SyncEngine::new(
            transport.clone(),
            Arc::new(FixedClock::new(today())),
            SyncConfig::default(),
        ));
        engine.init(vec![HabitSnapshot {
            habit_id: HabitId(1),
            entries: vec![],
        }]);

        let yesterday = today().pred_opt().unwrap();
        transport.fail_next(ToggleError::transient("timeout"));
        transport.fail_next(ToggleError::transient("timeout"));
        engine.toggle(HabitId(1), yesterday).unwrap();
        engine.toggle(HabitId(1), today()).unwrap();
        assert_eq!(engine.pending_count(), 2);

        // A second drain runs while the first one is sending yesterday's
        // toggle and confirms today's.
        let other = Arc::clone(&engine);
        *transport.during_next_call.lock() = Some(Box::new(move || {
            let report = other.retry_now();
            assert_eq!(report.confirmed, 1);
            assert_eq!(report.skipped, 1);
        }));

        let report = engine.retry_now();
        assert_eq!(report.confirmed, 1);
        assert_eq!(engine.pending_count(), 0);
        assert!(engine.is_completed(HabitId(1), yesterday));
        assert!(engine.is_completed(HabitId(1), today()));

        // Two failed sends, then one each for yesterday and today.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
        assert!(transport
            .completed
            .lock()
            .contains(&EntryKey::new(HabitId(1), today())));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (engine, transport) = engine();
        transport.fail_next(ToggleError::transient("offline"));
        engine.toggle(HabitId(1), today()).unwrap();

        engine.reset();
        assert!(engine.habit_ids().is_empty());
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.stats(HabitId(1)), None);
    }
}
