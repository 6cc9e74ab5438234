//! Per-statement execution outcomes.

use std::time::Duration;

use crate::value::{Fault, Value};

#[derive(Debug, Clone, Default)]
pub enum ExecutionOutcome {
    /// Initial state, and the final state of every statement after one
    /// that halted execution.
    #[default]
    NotExecuted,
    Normal { value: Value, elapsed: Duration },
    Exceptional { fault: Fault, elapsed: Duration },
}

impl ExecutionOutcome {
    pub fn is_normal(&self) -> bool {
        matches!(self, ExecutionOutcome::Normal { .. })
    }

    pub fn is_exceptional(&self) -> bool {
        matches!(self, ExecutionOutcome::Exceptional { .. })
    }

    pub fn is_not_executed(&self) -> bool {
        matches!(self, ExecutionOutcome::NotExecuted)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ExecutionOutcome::Normal { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ExecutionOutcome::Exceptional { fault, .. } => Some(fault),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            ExecutionOutcome::Normal { elapsed, .. }
            | ExecutionOutcome::Exceptional { elapsed, .. } => *elapsed,
            ExecutionOutcome::NotExecuted => Duration::ZERO,
        }
    }
}
