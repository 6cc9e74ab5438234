//! What an executed sequence is judged against: object contracts, the
//! checks visitors attach to statements, and failure extraction.

pub mod check;
pub mod contract;
pub mod failure;
pub mod strings;

pub use check::{Check, CheckDecorator, PrintMode, TestChecks};
pub use contract::{default_contracts, ContractError, ContractOutcome, ObjectContract};
pub use failure::{Failure, FailureAnalyzer};
