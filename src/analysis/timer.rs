// High-resolution timing and the run-wide time budget

use std::time::{Duration, Instant};

pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        to_ms(self.elapsed())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Time a single call, returning its result and duration in milliseconds
pub fn time_once<F, T>(f: F) -> (T, f64)
where
    F: FnOnce() -> T,
{
    let timer = Timer::start();
    let result = f();
    (result, timer.elapsed_ms())
}

pub fn to_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Wall-clock budget shared by every call a run makes
#[derive(Debug, Clone)]
pub struct RunBudget {
    started: Instant,
    limit: Duration,
}

impl RunBudget {
    pub fn new(limit: Duration) -> Self {
        Self { started: Instant::now(), limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        to_ms(self.elapsed())
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// The instant at which the budget runs out
    pub fn deadline(&self) -> Instant {
        self.started + self.limit
    }

    /// Deadline for a call starting now: the per-call ceiling or the end of
    /// the budget, whichever comes first
    pub fn call_deadline(&self, per_call: Duration) -> Instant {
        (Instant::now() + per_call).min(self.deadline())
    }
}
