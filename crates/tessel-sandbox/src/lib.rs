//! Running sequences: the execution driver, the visitors that attach
//! checks while a sequence runs, and an in-memory backend for tests.

pub mod config;
pub mod console;
pub mod contract_visitor;
pub mod executable;
pub mod regression;
pub mod scripted;
pub mod visitor;

pub use config::ExecConfig;
pub use contract_visitor::ContractCheckingVisitor;
pub use executable::{ExecutableSequence, SandboxError};
pub use regression::RegressionCaptureVisitor;
pub use scripted::{EqualsMode, OutputSink, ScriptedBackend, ScriptedObject};
pub use visitor::{DummyVisitor, ExecutionVisitor, MultiVisitor, VisitError};
