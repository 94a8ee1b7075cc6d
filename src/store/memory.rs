//! Volatile entry store.

use super::state::LedgerState;
use super::EntryStore;
use crate::error::{Result, StoreError};
use crate::types::{Habit, HabitEntry, HabitId, HabitInput, UserId};
use chrono::NaiveDate;
use parking_lot::RwLock;

/// Entry store kept entirely in memory.
#[derive(Default)]
pub struct MemoryEntryStore {
    state: RwLock<LedgerState>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all habits.
    pub fn entry_count(&self) -> usize {
        self.state.read().entry_count()
    }
}

impl EntryStore for MemoryEntryStore {
    fn habit(&self, id: HabitId) -> Result<Option<Habit>> {
        Ok(self.state.read().habit(id).cloned())
    }

    fn habits_for(&self, owner: &UserId) -> Result<Vec<Habit>> {
        Ok(self.state.read().habits_for(owner))
    }

    fn create_habit(&self, owner: &UserId, input: HabitInput) -> Result<Habit> {
        self.state.write().create_habit(owner, input)
    }

    fn update_habit(&self, id: HabitId, input: HabitInput) -> Result<Habit> {
        self.state.write().update_habit(id, input)
    }

    fn archive_habit(&self, id: HabitId) -> Result<Habit> {
        self.state.write().archive_habit(id)
    }

    fn restore_habit(&self, id: HabitId) -> Result<Habit> {
        self.state.write().restore_habit(id)
    }

    fn entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>> {
        Ok(self.state.read().entry(habit_id, date).cloned())
    }

    fn entries(&self, habit_id: HabitId) -> Result<Vec<HabitEntry>> {
        let state = self.state.read();
        if state.habit(habit_id).is_none() {
            return Err(StoreError::HabitNotFound(habit_id));
        }
        Ok(state.entries(habit_id))
    }

    fn insert_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<HabitEntry> {
        self.state.write().insert_entry(habit_id, date)
    }

    fn delete_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>> {
        Ok(self.state.write().delete_entry(habit_id, date))
    }
}
