//! Map memory and goal inference.

pub mod inference;
pub mod map;

pub use inference::{infer, GoalSource, MapKnowledge, StageVariant};
pub use map::MapMemory;
