//! In-memory ledger state shared by the store backends.

use crate::error::{Result, StoreError};
use crate::types::{EntryId, Habit, HabitEntry, HabitId, HabitInput, Timestamp, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Habits and entries, plus id counters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct LedgerState {
    habits: HashMap<HabitId, Habit>,

    /// Entries per habit, keyed by day. One slot per day is the uniqueness
    /// constraint.
    entries: HashMap<HabitId, BTreeMap<NaiveDate, HabitEntry>>,

    next_habit_id: u64,
    next_entry_id: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            habits: HashMap::new(),
            entries: HashMap::new(),
            next_habit_id: 1,
            next_entry_id: 1,
        }
    }
}

impl LedgerState {
    pub fn habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.get(&id)
    }

    pub fn habits_for(&self, owner: &UserId) -> Vec<Habit> {
        let mut habits: Vec<Habit> = self
            .habits
            .values()
            .filter(|h| h.is_visible_to(owner))
            .cloned()
            .collect();
        habits.sort_by_key(|h| h.id);
        habits
    }

    pub fn create_habit(&mut self, owner: &UserId, input: HabitInput) -> Result<Habit> {
        let name = input.name.trim().to_string();
        self.check_name_free(owner, &name, None)?;

        let id = HabitId(self.next_habit_id);
        self.next_habit_id += 1;

        let now = Timestamp::now();
        let habit = Habit {
            id,
            owner: owner.clone(),
            name,
            description: input.description,
            color: input.color,
            icon: input.icon,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.habits.insert(id, habit.clone());
        Ok(habit)
    }

    pub fn update_habit(&mut self, id: HabitId, input: HabitInput) -> Result<Habit> {
        let (owner, deleted) = match self.habits.get(&id) {
            Some(h) => (h.owner.clone(), h.is_deleted()),
            None => return Err(StoreError::HabitNotFound(id)),
        };

        let name = input.name.trim().to_string();
        if !deleted {
            self.check_name_free(&owner, &name, Some(id))?;
        }

        let habit = self
            .habits
            .get_mut(&id)
            .ok_or(StoreError::HabitNotFound(id))?;
        habit.name = name;
        habit.description = input.description;
        habit.color = input.color;
        habit.icon = input.icon;
        habit.updated_at = Timestamp::now();
        Ok(habit.clone())
    }

    pub fn archive_habit(&mut self, id: HabitId) -> Result<Habit> {
        let habit = self
            .habits
            .get_mut(&id)
            .ok_or(StoreError::HabitNotFound(id))?;
        if habit.deleted_at.is_none() {
            let now = Timestamp::now();
            habit.deleted_at = Some(now);
            habit.updated_at = now;
        }
        Ok(habit.clone())
    }

    pub fn restore_habit(&mut self, id: HabitId) -> Result<Habit> {
        let (owner, name) = match self.habits.get(&id) {
            Some(h) if h.is_deleted() => (h.owner.clone(), h.name.clone()),
            Some(h) => return Ok(h.clone()),
            None => return Err(StoreError::HabitNotFound(id)),
        };

        self.check_name_free(&owner, &name, Some(id))?;

        let habit = self
            .habits
            .get_mut(&id)
            .ok_or(StoreError::HabitNotFound(id))?;
        habit.deleted_at = None;
        habit.updated_at = Timestamp::now();
        Ok(habit.clone())
    }

    pub fn entry(&self, habit_id: HabitId, date: NaiveDate) -> Option<&HabitEntry> {
        self.entries.get(&habit_id).and_then(|days| days.get(&date))
    }

    pub fn entries(&self, habit_id: HabitId) -> Vec<HabitEntry> {
        self.entries
            .get(&habit_id)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert_entry(&mut self, habit_id: HabitId, date: NaiveDate) -> Result<HabitEntry> {
        if !self.habits.contains_key(&habit_id) {
            return Err(StoreError::HabitNotFound(habit_id));
        }

        let days = self.entries.entry(habit_id).or_default();
        if days.contains_key(&date) {
            return Err(StoreError::EntryExists { habit_id, date });
        }

        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;

        let now = Timestamp::now();
        let entry = HabitEntry {
            id,
            habit_id,
            date,
            completed: true,
            created_at: now,
            updated_at: now,
        };
        days.insert(date, entry.clone());
        Ok(entry)
    }

    pub fn delete_entry(&mut self, habit_id: HabitId, date: NaiveDate) -> Option<HabitEntry> {
        let days = self.entries.get_mut(&habit_id)?;
        let removed = days.remove(&date);
        if days.is_empty() {
            self.entries.remove(&habit_id);
        }
        removed
    }

    pub fn habit_count(&self) -> usize {
        self.habits.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Names are unique among the owner's non-archived habits.
    fn check_name_free(&self, owner: &UserId, name: &str, except: Option<HabitId>) -> Result<()> {
        let taken = self.habits.values().any(|h| {
            Some(h.id) != except && h.is_visible_to(owner) && h.name == name
        });
        if taken {
            return Err(StoreError::DuplicateHabitName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_insert_enforces_one_entry_per_day() {
        let mut state = LedgerState::default();
        let owner = UserId::new("ana");
        let habit = state.create_habit(&owner, HabitInput::named("Run")).unwrap();

        let entry = state.insert_entry(habit.id, day(1)).unwrap();
        assert!(entry.completed);

        let again = state.insert_entry(habit.id, day(1));
        assert!(matches!(again, Err(StoreError::EntryExists { .. })));
        assert_eq!(state.entry_count(), 1);
    }

    #[test]
    fn test_insert_requires_known_habit() {
        let mut state = LedgerState::default();
        let result = state.insert_entry(HabitId(77), day(1));
        assert!(matches!(result, Err(StoreError::HabitNotFound(HabitId(77)))));
    }

    #[test]
    fn test_delete_entry_returns_removed() {
        let mut state = LedgerState::default();
        let owner = UserId::new("ana");
        let habit = state.create_habit(&owner, HabitInput::named("Run")).unwrap();
        state.insert_entry(habit.id, day(2)).unwrap();

        assert!(state.delete_entry(habit.id, day(2)).is_some());
        assert!(state.delete_entry(habit.id, day(2)).is_none());
        assert_eq!(state.entry_count(), 0);
    }

    #[test]
    fn test_names_unique_per_owner_among_active() {
        let mut state = LedgerState::default();
        let ana = UserId::new("ana");
        let bo = UserId::new("bo");

        let run = state.create_habit(&ana, HabitInput::named("Run")).unwrap();
        assert!(matches!(
            state.create_habit(&ana, HabitInput::named(" Run ")),
            Err(StoreError::DuplicateHabitName(_))
        ));

        // Another owner may reuse the name.
        state.create_habit(&bo, HabitInput::named("Run")).unwrap();

        // Archived habits free their name, and block the restore once reused.
        state.archive_habit(run.id).unwrap();
        let second = state.create_habit(&ana, HabitInput::named("Run")).unwrap();
        assert!(matches!(
            state.restore_habit(run.id),
            Err(StoreError::DuplicateHabitName(_))
        ));

        state
            .update_habit(second.id, HabitInput::named("Jog"))
            .unwrap();
        let restored = state.restore_habit(run.id).unwrap();
        assert!(!restored.is_deleted());
    }

    #[test]
    fn test_archive_is_soft_and_idempotent() {
        let mut state = LedgerState::default();
        let owner = UserId::new("ana");
        let habit = state.create_habit(&owner, HabitInput::named("Run")).unwrap();
        state.insert_entry(habit.id, day(3)).unwrap();

        let first = state.archive_habit(habit.id).unwrap();
        let second = state.archive_habit(habit.id).unwrap();
        assert_eq!(first.deleted_at, second.deleted_at);

        // History survives the archive.
        assert_eq!(state.entries(habit.id).len(), 1);
        assert!(state.habits_for(&owner).is_empty());
    }
}
