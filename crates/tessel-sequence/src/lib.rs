//! Immutable, structurally shared statement sequences.
//!
//! A sequence only ever grows by producing a new sequence: `extend` wraps
//! the old statement list in one more node and `concatenate` lays several
//! lists end to end. Inputs are stored as relative negative offsets, so
//! neither operation rewrites existing statements.

pub mod code;
pub mod error;
pub mod format;
pub mod list;
pub mod sequence;
pub mod statement;

pub use code::{NoDecoration, StatementDecorator};
pub use error::SequenceError;
pub use list::StatementList;
pub use sequence::{variable_name, Sequence, Variable};
pub use statement::{RelativeIndex, Statement};
