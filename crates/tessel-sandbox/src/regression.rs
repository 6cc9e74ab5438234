//! Regression checks: record what each statement currently produces so a
//! later run can detect a change in behavior.

use tessel_ir::literal::MAX_STRING_LITERAL_LEN;
use tessel_ir::{ExecutionOutcome, LiteralValue, Value};
use tessel_model::strings::matches_default_to_string;
use tessel_model::{Check, PrintMode};

use crate::executable::ExecutableSequence;
use crate::visitor::{ExecutionVisitor, VisitError};

const DATE: &str = "java.util.Date";

#[derive(Debug, Default)]
pub struct RegressionCaptureVisitor;

impl RegressionCaptureVisitor {
    pub fn new() -> Self {
        Self
    }

    fn capture(seq: &ExecutableSequence, index: usize) -> Option<Check> {
        let stmt = seq.sequence.statement(index)?;
        let op = stmt.operation();
        match seq.outcome(index) {
            ExecutionOutcome::NotExecuted => None,
            ExecutionOutcome::Exceptional { fault, .. } => Some(Check::ExpectedException {
                class_name: fault.class_name.clone(),
            }),
            ExecutionOutcome::Normal { value, .. } => {
                let ty = stmt.output_type();
                if op.is_literal() || ty.is_void() {
                    return None;
                }
                // Identity-derived, different on every run.
                if op.is_nullary_method("toString") || op.is_nullary_method("hashCode") {
                    return None;
                }

                match value {
                    Value::Null => Some(Check::IsNull { var: index }),
                    v if v.is_primitive_like() => {
                        if let Some(s) = v.as_str() {
                            if matches_default_to_string(s)
                                || s.chars().count() > MAX_STRING_LITERAL_LEN
                            {
                                return None;
                            }
                        }
                        if Self::derived_from_new_date(seq, index) {
                            return None;
                        }
                        let literal = LiteralValue::from_value(v)?;
                        let mode = if ty.is_primitive() {
                            PrintMode::Eq
                        } else {
                            PrintMode::Equals
                        };
                        Some(Check::PrimValue {
                            var: index,
                            value: literal.java_code(),
                            mode,
                        })
                    }
                    _ if op.is_constructor() => None,
                    _ => Some(Check::IsNotNull { var: index }),
                }
            }
        }
    }

    /// A single-input call on a `Date` that was built by a constructor in
    /// this sequence reads the clock.
    fn derived_from_new_date(seq: &ExecutableSequence, index: usize) -> bool {
        let inputs = seq.sequence.input_indices(index);
        let [receiver] = inputs.as_slice() else {
            return false;
        };
        let Some(creator) = seq.sequence.statement(*receiver) else {
            return false;
        };
        creator.output_type().name() == DATE && creator.operation().is_constructor()
    }
}

impl ExecutionVisitor for RegressionCaptureVisitor {
    fn visit_after(
        &mut self,
        seq: &mut ExecutableSequence,
        index: usize,
    ) -> Result<(), VisitError> {
        if let Some(check) = Self::capture(seq, index) {
            seq.add_check(index, check);
        }
        Ok(())
    }
}
