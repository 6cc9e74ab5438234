pub mod collection;
pub mod helper;
pub mod manager;
pub mod subtype;

pub use collection::{SequenceCollection, SequenceView};
pub use manager::ComponentManager;
pub use subtype::SubTypeSet;
