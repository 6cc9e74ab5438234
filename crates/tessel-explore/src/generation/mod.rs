//! Forward generation: configuration, seeds, object cache and the step
//! state machine.

pub mod config;
pub mod error;
pub mod forward;
pub mod seeds;
pub mod state_matcher;

pub use config::{GenConfig, LiteralScope};
pub use error::GenerationError;
pub use forward::{ForwardGenerator, GeneratorCounters};
pub use seeds::default_seeds;
pub use state_matcher::{EqualsMatcher, StateMatcher};
