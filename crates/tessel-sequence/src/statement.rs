use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessel_ir::{Operation, Type};

use crate::error::SequenceError;

/// Offset of an input relative to the statement that consumes it: `-k`
/// names the value produced `k` statements earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeIndex(i32);

impl RelativeIndex {
    pub fn new(offset: i64) -> Result<Self, SequenceError> {
        if offset >= 0 || offset < i64::from(i32::MIN) {
            return Err(SequenceError::InvalidRelativeIndex(offset));
        }
        Ok(Self(offset as i32))
    }

    pub fn offset(self) -> i32 {
        self.0
    }

    /// Absolute index of the referenced statement, as seen from the
    /// statement at `position`.
    pub fn resolve(self, position: usize) -> Option<usize> {
        position.checked_sub(self.0.unsigned_abs() as usize)
    }
}

/// One operation application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    operation: Arc<Operation>,
    inputs: Vec<RelativeIndex>,
}

impl Statement {
    pub fn new(operation: Arc<Operation>, inputs: Vec<RelativeIndex>) -> Self {
        Self { operation, inputs }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn operation_arc(&self) -> &Arc<Operation> {
        &self.operation
    }

    pub fn inputs(&self) -> &[RelativeIndex] {
        &self.inputs
    }

    pub fn output_type(&self) -> Type {
        self.operation.output_type()
    }

    pub fn is_literal(&self) -> bool {
        self.operation.is_literal()
    }

    pub fn is_null_literal(&self) -> bool {
        self.operation.is_null_literal()
    }

    /// Hash contribution of this statement to its sequence.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_index_must_be_negative() {
        assert!(RelativeIndex::new(0).is_err());
        assert!(RelativeIndex::new(3).is_err());
        assert_eq!(RelativeIndex::new(-2).unwrap().offset(), -2);
    }

    #[test]
    fn test_relative_index_resolve() {
        let idx = RelativeIndex::new(-2).unwrap();
        assert_eq!(idx.resolve(5), Some(3));
        assert_eq!(idx.resolve(1), None);
    }
}
