use crate::{Error, Result};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of [`SlidingWindowLimiter::check_and_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Quota snapshot for one client, serialized as the status endpoint body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_ms: u64,
}

/// Per-client rolling-window limiter.
///
/// Each client keeps the arrival times of its admitted requests. A request is
/// admitted while fewer than `limit` of them are younger than `window`.
/// Expired timestamps are dropped whenever the client is touched; clients
/// that go quiet stay in the map until [`sweep`](Self::sweep) runs.
///
/// The whole map sits behind one synchronous mutex, so check-then-record is
/// atomic across tasks. Never hold the guard across an `.await`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: u32,
    window: Duration,
    entries: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(Error::config("rate limit window must be greater than 0"));
        }
        Ok(Self {
            limit,
            window,
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length in whole hours, rounded down.
    pub fn window_hours(&self) -> u64 {
        self.window.as_secs() / 3600
    }

    /// Admits and records `now` for `client` if it still has quota.
    /// Rejected requests are not recorded.
    pub fn check_and_record(&self, client: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.lock();
        let timestamps = entries.entry(client.to_string()).or_default();
        self.prune(timestamps, now);

        let active = timestamps.len() as u64;
        if active >= u64::from(self.limit) {
            let retry_after = self.time_until_reset(timestamps, now);
            // Keep the never-admitted key out of the map when the quota is 0.
            if timestamps.is_empty() {
                entries.remove(client);
            }
            return RateLimitDecision::Rejected { retry_after };
        }

        timestamps.push_back(now);
        RateLimitDecision::Admitted {
            remaining: self.limit - timestamps.len() as u32,
        }
    }

    /// Read-only view of `client`'s quota at `now`.
    pub fn status(&self, client: &str, now: Instant) -> RateLimitStatus {
        let entries = self.lock();
        let active: VecDeque<Instant> = entries
            .get(client)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .copied()
                    .filter(|ts| self.is_active(*ts, now))
                    .collect()
            })
            .unwrap_or_default();

        let used = u32::try_from(active.len()).unwrap_or(u32::MAX);
        RateLimitStatus {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            reset_ms: self.time_until_reset(&active, now).as_millis() as u64,
        }
    }

    /// Drops clients with no timestamps left in the window. Returns how many
    /// were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, timestamps| {
            self.prune(timestamps, now);
            !timestamps.is_empty()
        });
        before - entries.len()
    }

    /// Number of clients currently held in memory.
    pub fn tracked_identifiers(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        // The map stays consistent even if a holder panicked mid-request.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_active(&self, ts: Instant, now: Instant) -> bool {
        now.saturating_duration_since(ts) < self.window
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        timestamps.retain(|ts| self.is_active(*ts, now));
    }

    /// Time until the oldest active entry leaves the window, or the full
    /// window when nothing is active. `timestamps` must already be pruned.
    ///
    /// Callers read the clock before taking the lock, so entries are not
    /// guaranteed to be in arrival order.
    fn time_until_reset(&self, timestamps: &VecDeque<Instant>, now: Instant) -> Duration {
        timestamps
            .iter()
            .min()
            .map(|oldest| self.window - now.saturating_duration_since(*oldest))
            .unwrap_or(self.window)
    }
}
