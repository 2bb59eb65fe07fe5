//! Timing of the stats recompute cycle (re-read, aggregate, persist).

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::warn;

use crate::error::{AppError, Result};

/// Upper bound of the histogram, in microseconds (100s).
const MAX_TRACKED_US: u64 = 100_000_000;

/// What one finished recompute looked like.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastRecompute {
    pub duration_us: u64,
    pub total_matches: u64,
}

/// Served by `GET /stats/latency`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputeReport {
    pub samples: u64,
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
    pub max_us: Option<u64>,
    pub last: Option<LastRecompute>,
}

struct Timings {
    histogram: Histogram<u64>,
    last: Option<LastRecompute>,
}

/// Durations of successful recomputes, keyed by how many matches each one folded.
pub struct RecomputeTimings {
    inner: Mutex<Timings>,
}

impl RecomputeTimings {
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_US, 3)
            .map_err(|e| AppError::Config(format!("recompute histogram: {e}")))?;
        Ok(Self {
            inner: Mutex::new(Timings { histogram, last: None }),
        })
    }

    /// Record one completed recompute over `total_matches` records.
    pub fn observe(&self, elapsed: Duration, total_matches: u64) -> LastRecompute {
        let duration_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let last = LastRecompute { duration_us, total_matches };

        let mut timings = self.lock();
        if let Err(e) = timings.histogram.record(duration_us.clamp(1, MAX_TRACKED_US)) {
            warn!(duration_us, "Recompute duration not recorded: {e}");
        }
        timings.last = Some(last);
        last
    }

    pub fn report(&self) -> RecomputeReport {
        let timings = self.lock();
        let h = &timings.histogram;
        let quantile = |q: f64| (h.len() > 0).then(|| h.value_at_quantile(q));
        RecomputeReport {
            samples: h.len(),
            p50_us: quantile(0.5),
            p95_us: quantile(0.95),
            p99_us: quantile(0.99),
            max_us: (h.len() > 0).then(|| h.max()),
            last: timings.last,
        }
    }

    /// A panic while holding the lock leaves only counters behind, so keep using them.
    fn lock(&self) -> MutexGuard<'_, Timings> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
