//! Client-side copy of habit entries.

use crate::stats::DayRecord;
use crate::types::{EntryId, EntryKey, HabitEntry, HabitId, HabitSnapshot, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Identity of a mirrored entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryRef {
    /// Made up locally; the server has not confirmed it yet.
    Speculative(u64),
    /// Assigned by the server.
    Confirmed(EntryId),
}

/// One entry as the client currently believes it to be.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MirrorEntry {
    pub id: EntryRef,
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MirrorEntry {
    pub(crate) fn speculative(key: EntryKey, seq: u64) -> Self {
        let now = Timestamp::now();
        Self {
            id: EntryRef::Speculative(seq),
            habit_id: key.habit_id,
            date: key.date,
            completed: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_speculative(&self) -> bool {
        matches!(self.id, EntryRef::Speculative(_))
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.habit_id, self.date)
    }
}

impl From<HabitEntry> for MirrorEntry {
    fn from(entry: HabitEntry) -> Self {
        Self {
            id: EntryRef::Confirmed(entry.id),
            habit_id: entry.habit_id,
            date: entry.date,
            completed: entry.completed,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

impl DayRecord for MirrorEntry {
    fn day(&self) -> NaiveDate {
        self.date
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Entries per known habit.
#[derive(Debug, Default)]
pub(crate) struct LocalMirror {
    habits: HashMap<HabitId, BTreeMap<NaiveDate, MirrorEntry>>,
}

impl LocalMirror {
    pub fn from_snapshots(snapshots: Vec<HabitSnapshot>) -> Self {
        let mut habits = HashMap::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let days: BTreeMap<NaiveDate, MirrorEntry> = snapshot
                .entries
                .into_iter()
                .filter(|e| e.habit_id == snapshot.habit_id)
                .map(|e| (e.date, MirrorEntry::from(e)))
                .collect();
            habits.insert(snapshot.habit_id, days);
        }
        Self { habits }
    }

    pub fn contains_habit(&self, habit_id: HabitId) -> bool {
        self.habits.contains_key(&habit_id)
    }

    pub fn get(&self, key: EntryKey) -> Option<&MirrorEntry> {
        self.habits.get(&key.habit_id)?.get(&key.date)
    }

    /// Overwrite the slot for `key`. Ignored for habits the mirror does not
    /// know, so a late answer cannot resurrect a reset habit.
    pub fn set(&mut self, key: EntryKey, entry: Option<MirrorEntry>) {
        let Some(days) = self.habits.get_mut(&key.habit_id) else {
            return;
        };
        match entry {
            Some(entry) => {
                days.insert(key.date, entry);
            }
            None => {
                days.remove(&key.date);
            }
        }
    }

    pub fn entries(&self, habit_id: HabitId) -> Option<Vec<MirrorEntry>> {
        self.habits
            .get(&habit_id)
            .map(|days| days.values().cloned().collect())
    }

    pub fn habit_ids(&self) -> Vec<HabitId> {
        let mut ids: Vec<HabitId> = self.habits.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(habit: u64, d: u32) -> HabitEntry {
        let now = Timestamp::now();
        HabitEntry {
            id: EntryId(d as u64),
            habit_id: HabitId(habit),
            date: NaiveDate::from_ymd_opt(2024, 8, d).unwrap(),
            completed: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_from_snapshots_skips_foreign_entries() {
        let mirror = LocalMirror::from_snapshots(vec![HabitSnapshot {
            habit_id: HabitId(1),
            entries: vec![entry(1, 1), entry(2, 2)],
        }]);

        assert_eq!(mirror.entries(HabitId(1)).unwrap().len(), 1);
        assert!(!mirror.contains_habit(HabitId(2)));
    }

    #[test]
    fn test_set_ignores_unknown_habit() {
        let mut mirror = LocalMirror::default();
        let key = EntryKey::new(HabitId(3), NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        mirror.set(key, Some(MirrorEntry::speculative(key, 1)));
        assert!(mirror.get(key).is_none());
    }
}
