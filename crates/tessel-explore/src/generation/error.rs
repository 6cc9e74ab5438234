use tessel_ir::OperationError;
use tessel_sandbox::SandboxError;
use tessel_sequence::SequenceError;

/// Fatal generation errors. Selection failures, oversized and duplicate
/// candidates are not errors; `step` reports them as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid generator configuration: {0}")]
    Config(String),

    #[error("sequence construction failed: {0}")]
    Sequence(#[from] SequenceError),

    #[error("operation misuse: {0}")]
    Operation(#[from] OperationError),

    #[error("execution failed: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("no variable of type {ty} in a component chosen for it:\n{sequence}")]
    NoMatchingVariable { ty: String, sequence: String },

    #[error("dedup bookkeeping disagrees with rendered code for:\n{code}")]
    Inconsistent { code: String },
}
