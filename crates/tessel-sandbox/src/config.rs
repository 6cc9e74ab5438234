/// Execution configuration: fault handling, output capture and timeouts.
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Stop at the first statement that throws. Later statements stay
    /// not-executed.
    pub stop_on_exception: bool,
    /// Collect whatever the code under test prints, under the console lock.
    pub capture_output: bool,
    /// Wall-clock budget per statement. None = unlimited.
    pub statement_timeout_ms: Option<u64>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            stop_on_exception: true,
            capture_output: true,
            statement_timeout_ms: Some(5_000), // 5 seconds
        }
    }
}

impl ExecConfig {
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_stop_on_exception(mut self, stop: bool) -> Self {
        self.stop_on_exception = stop;
        self
    }

    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn with_statement_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.statement_timeout_ms = ms;
        self
    }
}
