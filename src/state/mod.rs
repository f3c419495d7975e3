//! State representation: typed keys and the encoder that builds them.

pub mod encoder;
pub mod key;

pub use encoder::{KeyEncoding, StateEncoder};
pub use key::{Neighborhood, StateKey, SurroundingsKey};
