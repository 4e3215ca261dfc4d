//! Time source
//!
//! Reminder fire instants are naive local wall-clock times, while audit
//! timestamps are UTC. Both come from one [`Clock`] so tests can pin them.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    /// Current local wall-clock time, compared against reminder fire instants
    fn local_now(&self) -> NaiveDateTime;

    fn utc_now(&self) -> DateTime<Utc>;
}

/// Reads the host clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests
///
/// Local and UTC time are the same instant here; the offset is irrelevant
/// to every comparison the services make.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }

    fn read(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Clock for FixedClock {
    fn local_now(&self) -> NaiveDateTime {
        self.read()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.read().and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(6, 50, 0)
            .unwrap();
        let clock = FixedClock::new(start);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.local_now(), start + chrono::Duration::minutes(5));
        assert_eq!(clock.utc_now().naive_utc(), clock.local_now());
    }
}
