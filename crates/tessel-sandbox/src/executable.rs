//! A sequence together with the results of running it.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tessel_ir::{ExecutionBackend, ExecutionOutcome, OperationError, Value};
use tessel_model::{Check, CheckDecorator, Failure, FailureAnalyzer, TestChecks};
use tessel_sequence::Sequence;

use crate::config::ExecConfig;
use crate::console::console_lock;
use crate::visitor::{ExecutionVisitor, VisitError};

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("malformed statement: {0}")]
    Operation(#[from] OperationError),

    #[error("visitor failed: {0}")]
    Visit(#[from] VisitError),
}

#[derive(Debug, Clone)]
pub struct ExecutableSequence {
    pub sequence: Sequence,
    outcomes: Vec<ExecutionOutcome>,
    checks: Vec<TestChecks>,
    output: String,
    /// Time spent building the sequence.
    pub gen_time: Duration,
    /// Time spent running it.
    pub exec_time: Duration,
}

impl ExecutableSequence {
    pub fn new(sequence: Sequence) -> Self {
        let n = sequence.size();
        Self {
            sequence,
            outcomes: vec![ExecutionOutcome::NotExecuted; n],
            checks: vec![TestChecks::new(); n],
            output: String::new(),
            gen_time: Duration::ZERO,
            exec_time: Duration::ZERO,
        }
    }

    pub fn size(&self) -> usize {
        self.sequence.size()
    }

    pub fn outcome(&self, index: usize) -> &ExecutionOutcome {
        &self.outcomes[index]
    }

    pub fn outcomes(&self) -> &[ExecutionOutcome] {
        &self.outcomes
    }

    /// Value produced by statement `index`, if it ran normally.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.outcomes.get(index).and_then(ExecutionOutcome::value)
    }

    pub fn checks(&self) -> &[TestChecks] {
        &self.checks
    }

    pub fn add_check(&mut self, index: usize, check: Check) {
        self.checks[index].add(check);
    }

    /// Everything the code under test printed, in statement order.
    pub fn output(&self) -> &str {
        &self.output
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Run every statement left to right, calling the visitor around each.
    ///
    /// Execution stops early when a statement throws (if configured), when
    /// a statement's checks contain a failure, or when an input is missing:
    /// produced by a statement that did not complete normally, or a null
    /// that did not come from a null literal. Stopped statements stay
    /// `NotExecuted`.
    pub fn execute(
        &mut self,
        backend: &mut dyn ExecutionBackend,
        visitor: &mut dyn ExecutionVisitor,
        config: &ExecConfig,
    ) -> Result<(), SandboxError> {
        let n = self.sequence.size();
        self.outcomes = vec![ExecutionOutcome::NotExecuted; n];
        self.checks = vec![TestChecks::new(); n];
        self.output.clear();
        backend.set_timeout(config.statement_timeout());

        let start = Instant::now();
        visitor.initialize(self)?;

        for i in 0..n {
            visitor.visit_before(self, i)?;

            let Some(args) = self.gather_inputs(i) else {
                tracing::debug!(index = i, "input unavailable, halting execution");
                break;
            };
            let op = match self.sequence.statement(i) {
                Some(stmt) => stmt.operation_arc().clone(),
                None => break,
            };

            let outcome = if config.capture_output {
                let _console = console_lock();
                let outcome = op.execute(&args, backend)?;
                self.output.push_str(&backend.take_output());
                outcome
            } else {
                op.execute(&args, backend)?
            };

            let threw = outcome.is_exceptional();
            if let Some(fault) = outcome.fault() {
                tracing::debug!(index = i, fault = %fault, "statement threw");
            }
            self.outcomes[i] = outcome;

            visitor.visit_after(self, i)?;

            if self.checks[i].has_failure() || (threw && config.stop_on_exception) {
                break;
            }
        }

        self.exec_time = start.elapsed();
        Ok(())
    }

    fn gather_inputs(&self, index: usize) -> Option<Vec<Value>> {
        let mut args = Vec::new();
        for input in self.sequence.input_indices(index) {
            let value = self.outcomes.get(input)?.value()?;
            if value.is_null() && !self.sequence.is_null_literal(input) {
                return None;
            }
            args.push(value.clone());
        }
        Some(args)
    }

    // ── Classification ───────────────────────────────────────────────

    pub fn has_non_executed(&self) -> bool {
        self.outcomes.iter().any(ExecutionOutcome::is_not_executed)
    }

    /// Every statement completed without throwing.
    pub fn is_normal_execution(&self) -> bool {
        self.outcomes.iter().all(ExecutionOutcome::is_normal)
    }

    /// Index of the first statement that threw.
    pub fn exception_index(&self) -> Option<usize> {
        self.outcomes.iter().position(ExecutionOutcome::is_exceptional)
    }

    pub fn has_failure(&self) -> bool {
        self.checks.iter().any(TestChecks::has_failure)
    }

    pub fn failures(&self) -> BTreeSet<Failure> {
        FailureAnalyzer::failures(&self.sequence, &self.checks)
    }

    /// Source text with every check rendered around its statement.
    pub fn to_code_string(&self) -> String {
        self.sequence.to_code_with(&CheckDecorator::new(&self.checks))
    }
}
