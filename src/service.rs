//! Server-side toggle protocol.
//!
//! A toggle flips the completion of one (habit, date) pair by presence:
//! an existing entry is deleted, a missing one is created. The service holds
//! no lock across the lookup and the mutation; races between concurrent
//! toggles are settled by the store's uniqueness constraint.

use crate::clock::{Clock, SystemClock};
use crate::error::{StoreError, ToggleError};
use crate::events::{EventBus, LedgerEvent};
use crate::stats::{compute_stats, HabitStats};
use crate::store::EntryStore;
use crate::types::{Habit, HabitEntry, HabitId, HabitInput, HabitSnapshot, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a toggle as seen by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// Completion state of the pair after the toggle.
    pub completed: bool,

    /// The entry now stored for the pair, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<HabitEntry>,
}

/// Owner-scoped operations over an [`EntryStore`].
pub struct ToggleService<S: EntryStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl<S: EntryStore> ToggleService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            events: EventBus::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Bus carrying `Invalidated` events for habits whose derived views
    /// went stale.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Flip completion of `habit_id` on `date`. Dates after today are
    /// refused without touching the store.
    pub fn toggle(
        &self,
        caller: &UserId,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<ToggleResponse, ToggleError> {
        let today = self.clock.today();
        if date > today {
            return Err(ToggleError::FutureDate { date, today });
        }
        self.owned_habit(caller, habit_id)?;

        let response = match self.store.entry(habit_id, date)? {
            Some(_) => {
                // A concurrent toggle may have removed it first; the pair is
                // incomplete either way.
                if self.store.delete_entry(habit_id, date)?.is_none() {
                    debug!(%habit_id, %date, "entry already removed by a concurrent toggle");
                }
                ToggleResponse {
                    completed: false,
                    entry: None,
                }
            }
            None => match self.store.insert_entry(habit_id, date) {
                Ok(entry) => ToggleResponse {
                    completed: true,
                    entry: Some(entry),
                },
                Err(StoreError::EntryExists { .. }) => {
                    debug!(%habit_id, %date, "lost create race, re-reading");
                    let current = self.store.entry(habit_id, date)?;
                    ToggleResponse {
                        completed: current.is_some(),
                        entry: current,
                    }
                }
                Err(e) => return Err(e.into()),
            },
        };

        info!(%habit_id, %date, completed = response.completed, "toggled");
        self.events.publish(LedgerEvent::Invalidated { habit_id });
        Ok(response)
    }

    /// Derived stats of an owned habit, as of today.
    pub fn stats(&self, caller: &UserId, habit_id: HabitId) -> Result<HabitStats, ToggleError> {
        self.owned_habit(caller, habit_id)?;
        let entries = self.store.entries(habit_id)?;
        Ok(compute_stats(&entries, self.clock.today()))
    }

    /// Every active habit of `caller` with its entries, for seeding a client
    /// mirror.
    pub fn snapshot(&self, caller: &UserId) -> Result<Vec<HabitSnapshot>, ToggleError> {
        let habits = self.store.habits_for(caller)?;
        let mut snapshots = Vec::with_capacity(habits.len());
        for habit in habits {
            snapshots.push(HabitSnapshot {
                habit_id: habit.id,
                entries: self.store.entries(habit.id)?,
            });
        }
        Ok(snapshots)
    }

    pub fn create_habit(&self, caller: &UserId, input: HabitInput) -> Result<Habit, StoreError> {
        let habit = self.store.create_habit(caller, input)?;
        info!(habit_id = %habit.id, owner = %caller, "created habit");
        Ok(habit)
    }

    pub fn update_habit(
        &self,
        caller: &UserId,
        habit_id: HabitId,
        input: HabitInput,
    ) -> Result<Habit, StoreError> {
        self.owned_habit_any_state(caller, habit_id)?;
        let habit = self.store.update_habit(habit_id, input)?;
        self.events.publish(LedgerEvent::Invalidated { habit_id });
        Ok(habit)
    }

    pub fn archive_habit(&self, caller: &UserId, habit_id: HabitId) -> Result<Habit, StoreError> {
        self.owned_habit_any_state(caller, habit_id)?;
        let habit = self.store.archive_habit(habit_id)?;
        info!(%habit_id, "archived habit");
        self.events.publish(LedgerEvent::Invalidated { habit_id });
        Ok(habit)
    }

    pub fn restore_habit(&self, caller: &UserId, habit_id: HabitId) -> Result<Habit, StoreError> {
        self.owned_habit_any_state(caller, habit_id)?;
        let habit = self.store.restore_habit(habit_id)?;
        info!(%habit_id, "restored habit");
        self.events.publish(LedgerEvent::Invalidated { habit_id });
        Ok(habit)
    }

    /// Missing, archived and foreign habits are all reported as not found.
    fn owned_habit(&self, caller: &UserId, habit_id: HabitId) -> Result<Habit, ToggleError> {
        match self.store.habit(habit_id)? {
            Some(habit) if habit.is_visible_to(caller) => Ok(habit),
            _ => Err(ToggleError::NotFound { habit_id }),
        }
    }

    fn owned_habit_any_state(&self, caller: &UserId, habit_id: HabitId) -> Result<Habit, StoreError> {
        match self.store.habit(habit_id)? {
            Some(habit) if &habit.owner == caller => Ok(habit),
            _ => Err(StoreError::HabitNotFound(habit_id)),
        }
    }
}
