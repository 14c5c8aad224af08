//! Foundation types shared by the controller and the reference engine.

pub mod math;
mod pose;

pub use pose::{Point2D, Pose2D};
