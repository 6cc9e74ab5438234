use tessel_sandbox::ExecutableSequence;

use crate::limits::StopReason;

/// Hooks into a generation run. Every method has a no-op default.
pub trait GenerationListener {
    fn generation_started(&mut self) {}

    /// Called after every step; `None` when the step produced nothing.
    fn step_done(&mut self, _produced: Option<&ExecutableSequence>) {}

    fn generation_stopped(&mut self, _reason: StopReason) {}

    /// Checked before each step. Returning true ends the run.
    fn should_stop(&self) -> bool {
        false
    }
}
