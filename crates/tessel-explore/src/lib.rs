//! Feedback-directed sequence generation: the component pools, the
//! type-compatibility index behind them, and the forward generator.

pub mod components;
pub mod generation;
pub mod rng;

pub use components::{ComponentManager, SequenceCollection, SequenceView, SubTypeSet};
pub use generation::{
    default_seeds, EqualsMatcher, ForwardGenerator, GenConfig, GenerationError, GeneratorCounters,
    LiteralScope, StateMatcher,
};
pub use rng::Randomness;
