//! Where "today" comes from.

use chrono::{Days, Local, NaiveDate};
use parking_lot::Mutex;

/// Source of the current calendar day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar day of the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock() = today;
    }

    /// Move forward by `days`.
    pub fn advance(&self, days: u64) {
        let mut today = self.today.lock();
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }

    /// Move backward by `days`.
    pub fn rewind(&self, days: u64) {
        let mut today = self.today.lock();
        if let Some(prev) = today.checked_sub_days(Days::new(days)) {
            *today = prev;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let clock = FixedClock::new(start);

        clock.advance(1);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        clock.rewind(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
    }
}
