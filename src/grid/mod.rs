//! Grid primitives and the tile-query interface.

pub mod environment;
pub mod types;

pub use environment::{GridEnvironment, TileGrid};
pub use types::{Action, Coordinate, TileType};
