//! Error-revealing checks: object contracts and fault-revealing exceptions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tessel_ir::{ExecutionOutcome, FaultKind, Type, Value};
use tessel_model::contract::validate_contracts;
use tessel_model::{default_contracts, Check, ContractOutcome, ObjectContract};
use tessel_sequence::variable_name;

use crate::executable::ExecutableSequence;
use crate::visitor::{ExecutionVisitor, VisitError};

/// Exceptions that reveal a fault when thrown by the last statement.
const FAULT_REVEALING: [FaultKind; 3] = [
    FaultKind::NullPointer,
    FaultKind::Assertion,
    FaultKind::StackOverflow,
];

#[derive(Debug)]
pub struct ContractCheckingVisitor {
    contracts: Vec<Arc<dyn ObjectContract>>,
    every_statement: bool,
    null_input_npe_expected: bool,
}

impl ContractCheckingVisitor {
    pub fn new(contracts: Vec<Arc<dyn ObjectContract>>) -> Result<Self, VisitError> {
        validate_contracts(&contracts)?;
        Ok(Self {
            contracts,
            every_statement: false,
            null_input_npe_expected: false,
        })
    }

    pub fn with_default_contracts() -> Self {
        Self {
            contracts: default_contracts(),
            every_statement: false,
            null_input_npe_expected: false,
        }
    }

    /// Check contracts after every statement, not only the last.
    pub fn every_statement(mut self, every: bool) -> Self {
        self.every_statement = every;
        self
    }

    /// Treat a NullPointerException from a statement that was handed an
    /// explicit null as ordinary behavior.
    pub fn with_null_input_npe_expected(mut self, expected: bool) -> Self {
        self.null_input_npe_expected = expected;
        self
    }

    fn is_fault_revealing(&self, seq: &ExecutableSequence, index: usize, kind: FaultKind) -> bool {
        if !FAULT_REVEALING.contains(&kind) {
            return false;
        }
        if kind == FaultKind::NullPointer && self.null_input_npe_expected {
            let null_input = seq
                .sequence
                .input_indices(index)
                .into_iter()
                .any(|i| seq.sequence.is_null_literal(i));
            return !null_input;
        }
        true
    }

    /// Object-valued results up to `last`, grouped by runtime type.
    fn objects_by_type(seq: &ExecutableSequence, last: usize) -> BTreeMap<Type, Vec<usize>> {
        let mut groups: BTreeMap<Type, Vec<usize>> = BTreeMap::new();
        for i in 0..=last {
            let Some(ty) = seq.sequence.output_type(i) else {
                continue;
            };
            if ty.is_void() || ty.is_string() || ty.is_primitive() {
                continue;
            }
            if let Some(Value::Object(obj)) = seq.value(i) {
                groups.entry(obj.runtime_type()).or_default().push(i);
            }
        }
        groups
    }

    fn check_contracts(&self, seq: &mut ExecutableSequence, index: usize) {
        let groups = Self::objects_by_type(seq, index);
        let mut found = Vec::new();

        for indices in groups.values() {
            for contract in &self.contracts {
                if let Some(tuple) = Self::first_violation(seq, contract.as_ref(), indices) {
                    let names: Vec<String> = tuple.iter().map(|&i| variable_name(i)).collect();
                    found.push(Check::ContractViolation {
                        contract: contract.name().to_string(),
                        description: contract.description().to_string(),
                        code: contract.to_code(&names),
                        vars: tuple,
                    });
                }
            }
        }

        for check in found {
            tracing::debug!(index, check = ?check, "contract violated");
            seq.add_check(index, check);
        }
    }

    /// Enumerate ordered tuples (with repetition) over `indices`; one
    /// violation per contract and type is enough.
    fn first_violation(
        seq: &ExecutableSequence,
        contract: &dyn ObjectContract,
        indices: &[usize],
    ) -> Option<Vec<usize>> {
        let arity = contract.arity();
        let mut cursor = vec![0usize; arity];
        loop {
            let tuple: Vec<usize> = cursor.iter().map(|&c| indices[c]).collect();
            let values: Vec<Value> = tuple
                .iter()
                .filter_map(|&i| seq.value(i).cloned())
                .collect();
            if values.len() == arity {
                let violated = match contract.evaluate(&values) {
                    ContractOutcome::Holds => false,
                    ContractOutcome::Violated => true,
                    ContractOutcome::Threw(_) => contract.eval_exception_means_failure(),
                };
                if violated {
                    return Some(tuple);
                }
            }

            // Odometer increment.
            let mut pos = arity;
            loop {
                if pos == 0 {
                    return None;
                }
                pos -= 1;
                cursor[pos] += 1;
                if cursor[pos] < indices.len() {
                    break;
                }
                cursor[pos] = 0;
            }
        }
    }
}

impl ExecutionVisitor for ContractCheckingVisitor {
    fn visit_after(
        &mut self,
        seq: &mut ExecutableSequence,
        index: usize,
    ) -> Result<(), VisitError> {
        let is_last = index + 1 == seq.size();
        if !is_last && !self.every_statement {
            return Ok(());
        }

        match seq.outcome(index) {
            ExecutionOutcome::NotExecuted => Err(VisitError::NotExecuted { index }),
            ExecutionOutcome::Exceptional { fault, .. } => {
                if is_last && self.is_fault_revealing(seq, index, fault.kind) {
                    let class_name = fault.class_name.clone();
                    seq.add_check(index, Check::NoException { class_name });
                }
                Ok(())
            }
            ExecutionOutcome::Normal { .. } => {
                self.check_contracts(seq, index);
                Ok(())
            }
        }
    }
}
