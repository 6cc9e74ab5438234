//! Distinct failures revealed by a sequence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tessel_sequence::Sequence;

use crate::check::TestChecks;

/// A failure is identified by the operation of the statement it was
/// observed at and the kind of violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Failure {
    pub operation: String,
    pub violation: String,
}

pub struct FailureAnalyzer;

impl FailureAnalyzer {
    /// Extract every `(operation, violation)` pair from the failing checks.
    /// `checks` is indexed by statement; missing indices carry no checks.
    pub fn failures(sequence: &Sequence, checks: &[TestChecks]) -> BTreeSet<Failure> {
        let mut out = BTreeSet::new();
        for (index, tc) in checks.iter().enumerate() {
            let Some(stmt) = sequence.statement(index) else {
                continue;
            };
            for check in tc.failures() {
                if let Some(kind) = check.violation_kind() {
                    out.insert(Failure {
                        operation: stmt.operation().descriptor(),
                        violation: kind.to_string(),
                    });
                }
            }
        }
        out
    }
}
