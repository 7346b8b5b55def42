use std::sync::Mutex;

use jiff::{SignedDuration, Timestamp};

/// Source of the current time for token expiration and JWT claims.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// A clock frozen at the given number of seconds since the Unix epoch.
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self::new(Timestamp::from_second(seconds).unwrap_or(Timestamp::UNIX_EPOCH))
    }

    pub fn set(&self, now: Timestamp) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: SignedDuration) {
        if let Ok(mut guard) = self.now.lock()
            && let Ok(next) = guard.checked_add(by)
        {
            *guard = next;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or(Timestamp::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::from_unix_seconds(1_000);
        assert_eq!(clock.now().as_second(), 1_000);

        clock.advance(SignedDuration::from_secs(60));
        assert_eq!(clock.now().as_second(), 1_060);

        clock.set(Timestamp::UNIX_EPOCH);
        assert_eq!(clock.now().as_second(), 0);
    }
}
