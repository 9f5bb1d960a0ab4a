//! Timing context for scan and compaction calls
//!
//! A timer is owned by the caller and handed to an operation explicitly.
//! The operation brackets only its device phases, so allocation and host
//! copies are excluded from the measurement.

use std::time::{Duration, Instant};

/// Measures the device phases of the most recent timed operation
#[derive(Debug, Default)]
pub struct PerformanceTimer {
    started: Option<Instant>,
    previous: Option<Duration>,
}

impl PerformanceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start measuring, discarding any measurement already in flight
    pub fn start(&mut self) {
        if self.started.is_some() {
            tracing::warn!("timer restarted before the previous measurement was stopped");
        }
        self.started = Some(Instant::now());
    }

    /// Stop measuring and record the elapsed time
    ///
    /// Returns `None` if the timer was not running.
    pub fn stop(&mut self) -> Option<Duration> {
        let elapsed = self.started.take()?.elapsed();
        self.previous = Some(elapsed);
        Some(elapsed)
    }

    /// Run `f` between [`start`](Self::start) and [`stop`](Self::stop)
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.start();
        let result = f();
        self.stop();
        result
    }

    /// Elapsed time of the previous completed measurement
    pub fn elapsed(&self) -> Option<Duration> {
        self.previous
    }

    /// Elapsed time of the previous measurement in milliseconds
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.previous.map(|d| d.as_secs_f64() * 1000.0)
    }
}
