//! Which executed sequences are kept for output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tessel_model::Failure;
use tessel_sandbox::ExecutableSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every sequence. New failures are still recorded.
    All,
    /// Only sequences without failures.
    Pass,
    /// Only sequences revealing a failure not seen before in this run.
    #[default]
    Fail,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    /// Keep sequences whose trailing statements never ran.
    pub output_nonexec: bool,
    /// Record only the first new failure of a sequence, leaving the
    /// others to be reported by later sequences.
    pub short_circuit_failures: bool,
}

pub trait TestFilter {
    fn retain(&mut self, eseq: &ExecutableSequence) -> bool;
}

/// Filters by output mode, deduplicating failing sequences on their
/// `(operation, violation)` pairs.
#[derive(Debug, Default)]
pub struct DefaultTestFilter {
    config: OutputConfig,
    seen: BTreeSet<Failure>,
}

impl DefaultTestFilter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            seen: BTreeSet::new(),
        }
    }

    /// Failures already reported by a retained sequence.
    pub fn seen_failures(&self) -> &BTreeSet<Failure> {
        &self.seen
    }

    /// Record the failures of `eseq` not seen before. Returns whether
    /// there was at least one.
    fn record_new_failures(&mut self, eseq: &ExecutableSequence) -> bool {
        let fresh: Vec<Failure> = eseq
            .failures()
            .into_iter()
            .filter(|f| !self.seen.contains(f))
            .collect();
        if fresh.is_empty() {
            return false;
        }
        if self.config.short_circuit_failures {
            self.seen.extend(fresh.into_iter().take(1));
        } else {
            self.seen.extend(fresh);
        }
        true
    }
}

impl TestFilter for DefaultTestFilter {
    fn retain(&mut self, eseq: &ExecutableSequence) -> bool {
        if !self.config.output_nonexec && eseq.has_non_executed() {
            return false;
        }
        match self.config.mode {
            OutputMode::Pass => !eseq.has_failure(),
            OutputMode::Fail => eseq.has_failure() && self.record_new_failures(eseq),
            OutputMode::All => {
                self.record_new_failures(eseq);
                true
            }
        }
    }
}
