//! Error types for the ledger.

use crate::types::HabitId;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by entry stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Habit not found: {0}")]
    HabitNotFound(HabitId),

    #[error("Habit name already in use: {0}")]
    DuplicateHabitName(String),

    #[error("Entry already exists for habit {habit_id} on {date}")]
    EntryExists { habit_id: HabitId, date: NaiveDate },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Invalid store format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The closed set of failures a toggle can end in.
///
/// The service surfaces `Unauthorized`, `NotFound`, `Conflict` and
/// `Transient`; `FutureDate` is raised by the client guard. Whether a kind
/// is retried is decided by the sync engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Habit not found: {habit_id}")]
    NotFound { habit_id: HabitId },

    #[error("Concurrent toggle on habit {habit_id} for {date}")]
    Conflict { habit_id: HabitId, date: NaiveDate },

    #[error("Transient failure: {reason}")]
    Transient { reason: String },

    #[error("Cannot toggle {date}: it is after today ({today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },
}

impl ToggleError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ToggleError::Unauthorized => "unauthorized",
            ToggleError::NotFound { .. } => "not_found",
            ToggleError::Conflict { .. } => "conflict",
            ToggleError::Transient { .. } => "transient",
            ToggleError::FutureDate { .. } => "future_date",
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        ToggleError::Transient {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for ToggleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EntryExists { habit_id, date } => ToggleError::Conflict { habit_id, date },
            StoreError::HabitNotFound(habit_id) => ToggleError::NotFound { habit_id },
            other => ToggleError::Transient {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_maps_to_taxonomy() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let err: ToggleError = StoreError::EntryExists {
            habit_id: HabitId(3),
            date,
        }
        .into();
        assert_eq!(
            err,
            ToggleError::Conflict {
                habit_id: HabitId(3),
                date
            }
        );

        let err: ToggleError = StoreError::HabitNotFound(HabitId(9)).into();
        assert_eq!(err.kind(), "not_found");

        let err: ToggleError = StoreError::Corruption("bad crc".into()).into();
        assert!(matches!(err, ToggleError::Transient { .. }));
    }
}
