//! Time abstraction for testability.
//!
//! Record timestamps (`created_at`, `updated_at`, `processed_at`) are taken
//! from a [`Clock`] so tests can pin them instead of racing the system clock.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
///
/// # Example
///
/// ```
/// use hookgate::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now.timestamp() > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests.
#[cfg(test)]
pub mod mock {
    use super::Clock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock that only moves when told to.
    #[derive(Debug)]
    pub struct MockClock {
        /// Seconds since the Unix epoch.
        secs: AtomicI64,
    }

    impl MockClock {
        /// Creates a clock frozen at `initial_secs` after the epoch.
        #[must_use]
        pub const fn new(initial_secs: i64) -> Self {
            Self {
                secs: AtomicI64::new(initial_secs),
            }
        }

        /// Moves the clock forward.
        pub fn advance(&self, secs: i64) {
            self.secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(self.secs.load(Ordering::SeqCst), 0)
                .single()
                .unwrap_or_default()
        }
    }

    impl Clock for std::sync::Arc<MockClock> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockClock;
    use super::*;

    #[test]
    fn system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = Utc::now();
        let result = clock.now();
        let after = Utc::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn system_clock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SystemClock>();
    }

    #[test]
    fn mock_clock_returns_controlled_time() {
        let clock = MockClock::new(1_000_000);

        assert_eq!(clock.now().timestamp(), 1_000_000);
    }

    #[test]
    fn mock_clock_can_advance() {
        let clock = MockClock::new(0);

        assert_eq!(clock.now().timestamp(), 0);

        clock.advance(100);
        assert_eq!(clock.now().timestamp(), 100);

        clock.advance(50);
        assert_eq!(clock.now().timestamp(), 150);
    }
}
