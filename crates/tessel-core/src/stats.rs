//! Run statistics.
//!
//! Per-operation execution counts, an exception-class histogram and
//! run-wide totals, serializable for post-run reporting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessel_ir::{ExecutionOutcome, FaultKind};
use tessel_sandbox::ExecutableSequence;

/// Counters for one operation, keyed by descriptor in `RunStatistics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    /// Statements of this operation that completed normally.
    pub normal_executions: u64,
    pub exceptional_executions: u64,
    /// Out-of-memory and stack-overflow faults.
    pub resource_exhaustions: u64,
    pub timeouts: u64,
    pub other_exceptions: u64,
    /// Total execution time in microseconds.
    pub execution_micros: u64,
    /// Sequences ending in this operation that stopped before reaching it.
    pub stopped_before_last: u64,
    /// Sequences ending in this operation that ran to completion normally.
    pub sequences_normal: u64,
    /// Sequences ending in this operation with a contract violation.
    pub contract_violations: u64,
}

impl OperationStats {
    pub fn executions(&self) -> u64 {
        self.normal_executions + self.exceptional_executions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub operations: BTreeMap<String, OperationStats>,
    /// Fault class name -> occurrences.
    pub exception_classes: BTreeMap<String, u64>,
    pub steps: u64,
    pub sequences_executed: u64,
    pub sequences_normal: u64,
    pub sequences_with_failure: u64,
    pub sequences_non_executed: u64,
    pub sequences_output: u64,
    pub elapsed_secs: f64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one executed sequence into the statistics.
    pub fn record(&mut self, eseq: &ExecutableSequence) {
        self.sequences_executed += 1;

        for (index, outcome) in eseq.outcomes().iter().enumerate() {
            let Some(stmt) = eseq.sequence.statement(index) else {
                continue;
            };
            if stmt.is_literal() {
                continue;
            }
            let stats = self
                .operations
                .entry(stmt.operation().descriptor())
                .or_default();
            match outcome {
                ExecutionOutcome::NotExecuted => {}
                ExecutionOutcome::Normal { elapsed, .. } => {
                    stats.normal_executions += 1;
                    stats.execution_micros += elapsed.as_micros() as u64;
                }
                ExecutionOutcome::Exceptional { fault, elapsed } => {
                    stats.exceptional_executions += 1;
                    stats.execution_micros += elapsed.as_micros() as u64;
                    if fault.is_resource_exhaustion() {
                        stats.resource_exhaustions += 1;
                    } else if fault.kind == FaultKind::Timeout {
                        stats.timeouts += 1;
                    } else {
                        stats.other_exceptions += 1;
                    }
                    *self
                        .exception_classes
                        .entry(fault.class_name.clone())
                        .or_default() += 1;
                }
            }
        }

        let has_failure = eseq.has_failure();
        let non_executed = eseq.has_non_executed();
        let normal = eseq.is_normal_execution();
        if has_failure {
            self.sequences_with_failure += 1;
        }
        if non_executed {
            self.sequences_non_executed += 1;
        }
        if normal {
            self.sequences_normal += 1;
        }

        if let Some(last) = eseq.sequence.last_statement() {
            let stats = self
                .operations
                .entry(last.operation().descriptor())
                .or_default();
            if non_executed {
                stats.stopped_before_last += 1;
            }
            if normal {
                stats.sequences_normal += 1;
            }
            if has_failure {
                stats.contract_violations += 1;
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
