use tessel_ir::{OperationError, ParseError};

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("Operation {descriptor} expects {expected} inputs, got {actual}")]
    Arity {
        descriptor: String,
        expected: usize,
        actual: usize,
    },

    #[error("Input {slot} refers to a variable of another sequence")]
    ForeignVariable { slot: usize },

    #[error("Variable index {index} out of bounds for sequence of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("Input {slot}: {found} cannot be used as {expected}")]
    IncompatibleInput {
        slot: usize,
        expected: String,
        found: String,
    },

    #[error("Relative index must be negative, got {0}")]
    InvalidRelativeIndex(i64),

    #[error("Line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}
