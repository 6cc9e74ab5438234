//! Hooks run around each statement while a sequence executes.

use tessel_model::ContractError;

use crate::executable::ExecutableSequence;

#[derive(Debug, thiserror::Error)]
pub enum VisitError {
    #[error("statement {index} was visited but never executed")]
    NotExecuted { index: usize },

    #[error("invalid contract set: {0}")]
    Contract(#[from] ContractError),
}

pub trait ExecutionVisitor {
    /// Called once before the first statement runs.
    fn initialize(&mut self, _sequence: &mut ExecutableSequence) -> Result<(), VisitError> {
        Ok(())
    }

    fn visit_before(
        &mut self,
        _sequence: &mut ExecutableSequence,
        _index: usize,
    ) -> Result<(), VisitError> {
        Ok(())
    }

    /// Called after statement `index` ran; its outcome is set.
    fn visit_after(
        &mut self,
        sequence: &mut ExecutableSequence,
        index: usize,
    ) -> Result<(), VisitError>;
}

/// Visitor that attaches nothing.
#[derive(Debug, Default)]
pub struct DummyVisitor;

impl ExecutionVisitor for DummyVisitor {
    fn visit_after(&mut self, _: &mut ExecutableSequence, _: usize) -> Result<(), VisitError> {
        Ok(())
    }
}

/// Runs several visitors in order.
#[derive(Default)]
pub struct MultiVisitor {
    visitors: Vec<Box<dyn ExecutionVisitor>>,
}

impl MultiVisitor {
    pub fn new(visitors: Vec<Box<dyn ExecutionVisitor>>) -> Self {
        Self { visitors }
    }

    pub fn add(&mut self, visitor: Box<dyn ExecutionVisitor>) {
        self.visitors.push(visitor);
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl ExecutionVisitor for MultiVisitor {
    fn initialize(&mut self, sequence: &mut ExecutableSequence) -> Result<(), VisitError> {
        for v in &mut self.visitors {
            v.initialize(sequence)?;
        }
        Ok(())
    }

    fn visit_before(
        &mut self,
        sequence: &mut ExecutableSequence,
        index: usize,
    ) -> Result<(), VisitError> {
        for v in &mut self.visitors {
            v.visit_before(sequence, index)?;
        }
        Ok(())
    }

    fn visit_after(
        &mut self,
        sequence: &mut ExecutableSequence,
        index: usize,
    ) -> Result<(), VisitError> {
        for v in &mut self.visitors {
            v.visit_after(sequence, index)?;
        }
        Ok(())
    }
}
