//! Reference engine: budgeted A* over a terrain grid.
//!
//! - [`TerrainGrid`]: field, fruit, off-field and blocked cells
//! - [`GridSearch`]: resumable search, a fixed number of expansions per step
//! - [`GridEngineFactory`]: resolves nodes, waypoints and poses into searches

mod factory;
mod map;
mod search;

pub use factory::GridEngineFactory;
pub use map::{Cell, GridCoord, TerrainGrid};
pub use search::GridSearch;
