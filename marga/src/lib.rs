//! Marga - tick-driven pathfinding with caller-steered retries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   controller/                       │  ← Request lifecycle
//! │     (PathfinderController, callbacks, outcome)      │
//! └─────────────────────────────────────────────────────┘
//!                          │ EngineFactory / SearchEngine
//! ┌─────────────────────────────────────────────────────┐
//! │                     engine/                         │  ← Search contract
//! │          (trait, entry points, grid A*)             │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │        core/, context, course, clock, config        │  ← Foundation
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! A caller builds a [`SearchContext`], registers callbacks once, and asks
//! the controller for a path to a node, a course waypoint, or a pose. The
//! controller steps the engine once per [`update`](PathfinderController::update)
//! and reports exactly one terminal result per request. When no path is
//! found and retries remain, the retry callback gets the failed context back
//! so the caller can relax it and search again.

pub mod clock;
pub mod config;
pub mod context;
pub mod controller;
pub mod core;
pub mod course;
pub mod debug;
pub mod engine;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ContextConfig, ControllerConfig, GridConfig, MargaConfig};
pub use context::{Area, SearchContext};
pub use controller::{
    CallbackRegistration, ControllerState, DriveData, PathOutcome, PathfinderController,
    PathfinderResult,
};
pub use crate::core::{Point2D, Pose2D};
pub use course::{Course, CourseWaypoint};
pub use debug::DebugVisualization;
pub use engine::grid::{Cell, GridCoord, GridEngineFactory, TerrainGrid};
pub use engine::{EngineFactory, EntryPoint, Launch, NodeId, SearchEngine, StepResult};
pub use error::{ControllerError, MargaError, Result};
