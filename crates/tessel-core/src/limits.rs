//! Run limits and stop conditions.
//!
//! A run stops cooperatively: the conditions are checked once per loop
//! iteration, never in the middle of a statement.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Limits for a single generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Maximum wall-clock seconds.
    pub time_limit_secs: u64,
    /// Stop once this many distinct sequences were generated.
    pub max_sequences: u64,
    /// Stop once this many sequences passed the output filter.
    pub max_output: u64,
    /// Maximum generator steps, successful or not.
    pub max_steps: u64,
    /// Period of the progress line. None disables the reporter.
    pub progress_interval_ms: Option<u64>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            time_limit_secs: 100,
            max_sequences: 100_000_000,
            max_output: 100_000_000,
            max_steps: u64::MAX,
            progress_interval_ms: None,
        }
    }
}

impl RunLimits {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn progress_interval(&self) -> Option<Duration> {
        self.progress_interval_ms.map(Duration::from_millis)
    }

    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_max_sequences(mut self, max: u64) -> Self {
        self.max_sequences = max;
        self
    }

    pub fn with_max_output(mut self, max: u64) -> Self {
        self.max_output = max;
        self
    }

    pub fn with_max_steps(mut self, max: u64) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_progress_interval_ms(mut self, ms: Option<u64>) -> Self {
        self.progress_interval_ms = ms;
        self
    }
}

/// Reason a run was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Wall-clock time limit exceeded.
    TimeLimit,
    /// Enough distinct sequences were generated.
    SequenceLimit,
    /// Enough sequences were kept for output.
    OutputLimit,
    StepLimit,
    /// A listener asked to stop.
    ListenerVeto,
    /// No selectable operation is left.
    Exhausted,
}

/// Checks progress against the limits.
pub struct StopChecker {
    limits: RunLimits,
    start_time: Instant,
}

impl StopChecker {
    pub fn new(limits: RunLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
        }
    }

    /// Returns None if the run may continue, or the reason for stopping.
    pub fn check(&self, steps: u64, generated: u64, output: u64) -> Option<StopReason> {
        if self.start_time.elapsed() >= self.limits.time_limit() {
            return Some(StopReason::TimeLimit);
        }
        if generated >= self.limits.max_sequences {
            return Some(StopReason::SequenceLimit);
        }
        if output >= self.limits.max_output {
            return Some(StopReason::OutputLimit);
        }
        if steps >= self.limits.max_steps {
            return Some(StopReason::StepLimit);
        }
        None
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn limits(&self) -> &RunLimits {
        &self.limits
    }
}
