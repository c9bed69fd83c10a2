//! Clock abstraction so issuance time can be injected in tests.

use std::{
    fmt,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time for credential expiry computation.
///
/// Production code uses [`SystemClock`]; tests inject a [`TestClock`] to
/// make issued usernames and digests fully deterministic.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Holds unix time in seconds; cloning shares the underlying instant so a
/// handler under test and the asserting test body observe the same time.
#[derive(Debug, Clone)]
pub struct TestClock {
    unix_secs: Arc<AtomicI64>,
}

impl TestClock {
    /// Creates a clock pinned at the given unix timestamp.
    pub fn at(unix_secs: i64) -> Self {
        Self { unix_secs: Arc::new(AtomicI64::new(unix_secs)) }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        self.unix_secs.fetch_add(secs, Ordering::AcqRel);
    }

    /// Jumps the clock to an absolute unix timestamp.
    pub fn set(&self, unix_secs: i64) {
        self.unix_secs.store(unix_secs, Ordering::Release);
    }

    /// Current unix timestamp in seconds.
    pub fn unix_secs(&self) -> i64 {
        self.unix_secs.load(Ordering::Acquire)
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.unix_secs(), 0).single().unwrap_or_default()
    }
}
