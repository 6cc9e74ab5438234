//! Driving a generation run: stop conditions, listeners, progress
//! reporting, output filtering and run statistics.

pub mod config;
pub mod filter;
pub mod limits;
pub mod listener;
pub mod progress;
pub mod run;
pub mod stats;

pub use config::RunConfig;
pub use filter::{DefaultTestFilter, OutputConfig, OutputMode, TestFilter};
pub use limits::{RunLimits, StopChecker, StopReason};
pub use listener::GenerationListener;
pub use progress::{CounterSnapshot, ProgressReporter, RunCounters};
pub use run::{GenerationRun, RunError, RunResult};
pub use stats::{OperationStats, RunStatistics};
