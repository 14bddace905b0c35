//! Calendar source for date stamping.
//!
//! Status transitions stamp `startedAt`/`finishedAt` with "today". The engine
//! asks a [`Clock`] instead of reading the system time directly so that the
//! stamping rules stay deterministic under test.

use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Provides the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date in the user's local calendar.
    fn today(&self) -> NaiveDate;
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// Create a clock fixed at the given calendar date.
    ///
    /// Returns `None` for an impossible date.
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock::ymd(2025, 3, 14).unwrap();
        assert_eq!(clock.today(), clock.today());
        assert_eq!(clock.today().to_string(), "2025-03-14");
    }

    #[test]
    fn fixed_clock_rejects_impossible_dates() {
        assert!(FixedClock::ymd(2025, 2, 30).is_none());
    }

    #[test]
    fn shared_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::ymd(2024, 1, 1).unwrap());
        assert_eq!(clock.today().to_string(), "2024-01-01");
    }
}
