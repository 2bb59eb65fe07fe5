//! Shared health state for the /health endpoint.
//! Updated by MatchService after every write and recomputation.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Shared health counters. Updated by the service, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// Successful match writes (add, update, delete).
    pub writes_total: AtomicU64,
    /// Recomputations that failed after the record write had landed.
    pub recompute_failures: AtomicU64,
    /// Millisecond timestamp of the last persisted stats snapshot (0 = none).
    pub last_recompute_at_ms: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub writes_total: u64,
    pub recompute_failures: u64,
    pub last_recompute_at_ms: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_writes(&self) {
        self.writes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_recompute_failures(&self) {
        self.recompute_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_last_recompute_at_ms(&self, ms: u64) {
        self.last_recompute_at_ms.store(ms, Ordering::Relaxed);
    }

    pub fn writes_total(&self) -> u64 {
        self.writes_total.load(Ordering::Relaxed)
    }

    pub fn recompute_failures(&self) -> u64 {
        self.recompute_failures.load(Ordering::Relaxed)
    }

    pub fn last_recompute_at_ms(&self) -> u64 {
        self.last_recompute_at_ms.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> HealthReport {
        let last = self.last_recompute_at_ms();
        HealthReport {
            ok: true,
            writes_total: self.writes_total(),
            recompute_failures: self.recompute_failures(),
            last_recompute_at_ms: (last > 0).then_some(last),
        }
    }
}
