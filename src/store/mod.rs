//! Entry stores: the persisted authority for habits and their entries.
//!
//! Every store enforces the central uniqueness constraint itself: at most
//! one entry per (habit, date). [`EntryStore::insert_entry`] is an atomic
//! check-and-insert that fails with [`StoreError::EntryExists`] when the
//! key is already taken, so callers never need a lock of their own.
//!
//! [`StoreError::EntryExists`]: crate::error::StoreError::EntryExists

mod file;
mod memory;
mod state;

pub use file::{FileEntryStore, StoreConfig};
pub use memory::MemoryEntryStore;

use crate::error::Result;
use crate::types::{Habit, HabitEntry, HabitId, HabitInput, UserId};
use chrono::NaiveDate;

/// Storage backend for habits and entries.
pub trait EntryStore: Send + Sync {
    /// Look up a habit, archived or not.
    fn habit(&self, id: HabitId) -> Result<Option<Habit>>;

    /// Non-archived habits of `owner`, ordered by id.
    fn habits_for(&self, owner: &UserId) -> Result<Vec<Habit>>;

    fn create_habit(&self, owner: &UserId, input: HabitInput) -> Result<Habit>;

    fn update_habit(&self, id: HabitId, input: HabitInput) -> Result<Habit>;

    /// Soft-delete a habit. Archiving an archived habit is a no-op.
    fn archive_habit(&self, id: HabitId) -> Result<Habit>;

    fn restore_habit(&self, id: HabitId) -> Result<Habit>;

    fn entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>>;

    /// Entries of one habit, ordered by date.
    fn entries(&self, habit_id: HabitId) -> Result<Vec<HabitEntry>>;

    /// Create a completed entry for (habit, date).
    fn insert_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<HabitEntry>;

    /// Remove the entry for (habit, date), returning it if one existed.
    fn delete_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>>;
}
