//! Operation-level vocabulary shared by every tessel crate: the type model,
//! runtime values and faults, the closed `Operation` sum type, and the
//! loaders for operation universes and literal pools.

pub mod backend;
pub mod literal;
pub mod literals_file;
pub mod operation;
pub mod outcome;
pub mod parse;
pub mod types;
pub mod universe;
pub mod value;

pub use backend::ExecutionBackend;
pub use literal::LiteralValue;
pub use operation::{Operation, OperationError};
pub use outcome::ExecutionOutcome;
pub use parse::ParseError;
pub use types::{Match, PrimitiveKind, Type, TypeRegistry};
pub use value::{Fault, FaultKind, RuntimeObject, Value};
