//! The reflection/execution seam.
//!
//! The engine never knows how a method or constructor is actually invoked;
//! it hands the operation and its concrete arguments to a backend and gets
//! back either a value or a thrown fault.

use std::time::Duration;

use crate::operation::Operation;
use crate::value::{Fault, Value};

pub trait ExecutionBackend {
    /// Invoke a method, constructor, field access or enum lookup.
    ///
    /// Literals and array creation never reach the backend. A call that
    /// exceeds the configured timeout must come back as a timeout fault.
    fn invoke(&mut self, op: &Operation, args: &[Value]) -> Result<Value, Fault>;

    /// Drain whatever the code under test printed since the last call.
    fn take_output(&mut self) -> String {
        String::new()
    }

    /// Per-call wall-clock budget. `None` disables the limit.
    fn set_timeout(&mut self, _timeout: Option<Duration>) {}
}
