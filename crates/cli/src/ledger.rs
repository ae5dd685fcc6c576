// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dedup and cooldown ledger.
//!
//! The only synchronization point between the stream driver and the
//! background dispatch tasks. Every check-and-set happens under one lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::Clock;

/// Cooldown channel armed after a dialog-backed decision.
pub const MAIN_DIALOG: &str = "main_dialog";

/// Entry count above which a write triggers cleanup.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Result of [`DedupLedger::try_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// The same prompt key was processed within the duplication window.
    Duplicate,
    /// The channel is inside a post-decision cooldown.
    CoolingDown,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub entries: usize,
    pub active_cooldowns: usize,
    pub total_processed: u64,
}

#[derive(Debug)]
struct Entry {
    last_processed_at: Instant,
    count: u32,
}

#[derive(Debug)]
struct Cooldown {
    active: bool,
    until: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    cooldowns: HashMap<String, Cooldown>,
    total_processed: u64,
}

pub struct DedupLedger {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_entries: usize,
}

impl DedupLedger {
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
            window,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Atomically check the cooldown on `channel` and the duplication window
    /// for `key`, recording `key` as processed when both pass.
    pub fn try_claim(&self, key: &str, channel: &str) -> Verdict {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if cooling(&inner, channel, now) {
            return Verdict::CoolingDown;
        }
        if let Some(entry) = inner.entries.get(key) {
            if now.saturating_duration_since(entry.last_processed_at) < self.window {
                return Verdict::Duplicate;
            }
        }
        self.record(&mut inner, key, now);
        Verdict::Accepted
    }

    /// Whether `key` was processed within the duplication window.
    pub fn is_duplicate(&self, key: &str) -> bool {
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .is_some_and(|e| now.saturating_duration_since(e.last_processed_at) < self.window)
    }

    pub fn mark_processed(&self, key: &str) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.record(&mut inner, key, now);
    }

    /// How many times `key` has been recorded.
    pub fn processed_count(&self, key: &str) -> u32 {
        self.inner.lock().entries.get(key).map_or(0, |e| e.count)
    }

    /// Arm a cooldown on `channel` for `duration`. Returns its deadline, which
    /// identifies this arming for [`release_cooldown`](Self::release_cooldown).
    pub fn arm_cooldown(&self, channel: &str, duration: Duration) -> Instant {
        let until = self.clock.now() + duration;
        self.inner.lock().cooldowns.insert(channel.to_owned(), Cooldown { active: true, until });
        until
    }

    pub fn is_cooling_down(&self, channel: &str) -> bool {
        let now = self.clock.now();
        cooling(&self.inner.lock(), channel, now)
    }

    pub fn clear_cooldown(&self, channel: &str) {
        if let Some(c) = self.inner.lock().cooldowns.get_mut(channel) {
            c.active = false;
        }
    }

    /// Clear the cooldown on `channel` only if it is still the one armed with
    /// deadline `until`.
    pub fn release_cooldown(&self, channel: &str, until: Instant) {
        let mut inner = self.inner.lock();
        if let Some(c) = inner.cooldowns.get_mut(channel) {
            if c.until == until {
                c.active = false;
            }
        }
    }

    /// Drop entries older than the duplication window and lapsed cooldowns.
    /// Returns the number of entries removed.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.prune(&mut inner, now)
    }

    pub fn stats(&self) -> LedgerStats {
        let now = self.clock.now();
        let inner = self.inner.lock();
        LedgerStats {
            entries: inner.entries.len(),
            active_cooldowns: inner
                .cooldowns
                .values()
                .filter(|c| c.active && now < c.until)
                .count(),
            total_processed: inner.total_processed,
        }
    }

    /// Spawn the periodic cleanup task. It stops when `cancel` fires.
    pub fn spawn_cleanup(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ledger.clock.sleep(interval) => {
                        let removed = ledger.clear_expired();
                        if removed > 0 {
                            debug!(removed, "ledger cleanup");
                        }
                    }
                }
            }
        })
    }

    fn record(&self, inner: &mut Inner, key: &str, now: Instant) {
        let entry = inner
            .entries
            .entry(key.to_owned())
            .or_insert(Entry { last_processed_at: now, count: 0 });
        entry.last_processed_at = now;
        entry.count += 1;
        inner.total_processed += 1;

        if inner.entries.len() > self.max_entries {
            self.prune(inner, now);
        }
    }

    fn prune(&self, inner: &mut Inner, now: Instant) -> usize {
        let before = inner.entries.len();
        let window = self.window;
        inner
            .entries
            .retain(|_, e| now.saturating_duration_since(e.last_processed_at) < window);
        inner.cooldowns.retain(|_, c| c.active && now < c.until);

        // Everything is fresh: evict oldest until back under the bound.
        if inner.entries.len() > self.max_entries {
            let mut by_age: Vec<(Instant, String)> = inner
                .entries
                .iter()
                .map(|(k, e)| (e.last_processed_at, k.clone()))
                .collect();
            by_age.sort();
            let excess = inner.entries.len() - self.max_entries;
            for (_, key) in by_age.into_iter().take(excess) {
                inner.entries.remove(&key);
            }
        }
        before - inner.entries.len()
    }
}

fn cooling(inner: &Inner, channel: &str, now: Instant) -> bool {
    inner.cooldowns.get(channel).is_some_and(|c| c.active && now < c.until)
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
