//! Pathfinding job controller.
//!
//! Wraps a resumable [`SearchEngine`](crate::engine::SearchEngine) behind a
//! start / update / callback contract with caller-steered retries.
//!
//! # Key Types
//!
//! - [`PathfinderController`]: request lifecycle, retry bookkeeping, dispatch
//! - [`CallbackRegistration`]: result and retry callbacks of one caller
//! - [`PathOutcome`]: validity rule applied to every finished search
//! - [`PathfinderResult`]: payload of the terminal callback

mod callbacks;
mod outcome;
mod pathfinder;

pub use callbacks::{CallbackRegistration, ResultCallback, RetryCallback};
pub use outcome::{MIN_VALID_PATH_POINTS, PathOutcome, PathfinderResult};
pub use pathfinder::{ControllerState, DriveData, PathfinderController};
