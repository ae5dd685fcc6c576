// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time source shared by the ledger and the dispatcher.
//!
//! Monotonic time is tokio's [`Instant`], so tests running under
//! `#[tokio::test(start_paused = true)]` get deterministic timers for free.
//! Wall-clock time is only used to stamp dialog messages.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::time::Instant;

/// Boxed sleep future returned by [`Clock::sleep`].
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Time source: `now`, wall-clock stamp, and `sleep` (which doubles as
/// `after(duration)` when raced in `tokio::select!`).
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Wall-clock nanoseconds since the Unix epoch.
    fn unix_nanos(&self) -> u128;

    fn sleep(&self, duration: Duration) -> Sleep;
}

/// Production clock backed by tokio's timer and the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_nanos(&self) -> u128 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// 2023-01-01T12:00:00Z, the wall-clock origin of [`ManualClock`].
pub const MANUAL_EPOCH_NANOS: u128 = 1_672_574_400_000_000_000;

/// Controllable clock for tests.
///
/// `now()` is a manually advanced offset from a base instant; `sleep()` still
/// uses tokio's timer so it cooperates with paused-time tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self { base: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn set_offset(&self, offset: Duration) {
        *self.offset.lock() = offset;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn unix_nanos(&self) -> u128 {
        MANUAL_EPOCH_NANOS + self.offset.lock().as_nanos()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}
