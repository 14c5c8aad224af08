//! Search engine contract.
//!
//! A [`SearchEngine`] is a resumable computation: the controller calls
//! [`SearchEngine::step`] once per tick until it reports `done`. Engines are
//! created through an [`EngineFactory`], which may also answer immediately
//! (trivial or unresolvable goals) with [`Launch::Finished`].
//!
//! [`grid`] holds a reference engine over a terrain grid.

pub mod grid;

use serde::{Deserialize, Serialize};

use crate::context::SearchContext;
use crate::core::{Point2D, Pose2D};
use crate::course::Course;

/// Address of a node in the caller's world graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Outcome of one engine step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepResult {
    /// The search has ended; no further steps are needed.
    pub done: bool,
    /// Found path, start to goal.
    pub path: Option<Vec<Pose2D>>,
    /// The engine could not resolve the goal at all.
    pub goal_invalid: Option<bool>,
}

impl StepResult {
    /// Still searching.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Finished with a path.
    pub fn found(path: Vec<Pose2D>) -> Self {
        Self {
            done: true,
            path: Some(path),
            goal_invalid: None,
        }
    }

    /// Finished without a path; the goal itself was valid.
    pub fn not_found() -> Self {
        Self {
            done: true,
            path: None,
            goal_invalid: Some(false),
        }
    }

    /// Finished because the goal could not be resolved.
    pub fn invalid_goal() -> Self {
        Self {
            done: true,
            path: None,
            goal_invalid: Some(true),
        }
    }
}

/// A resumable path search.
pub trait SearchEngine {
    /// Advance the search by one slice of work.
    fn step(&mut self) -> StepResult;

    /// True until a step has reported `done`.
    fn is_running(&self) -> bool;

    /// Nodes to show on a debug overlay.
    fn debug_nodes(&self) -> Vec<Point2D> {
        Vec::new()
    }
}

/// Result of starting a search.
pub enum Launch {
    /// Answered without stepping.
    Finished(StepResult),
    /// Needs stepping.
    Running(Box<dyn SearchEngine>),
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Launch::Finished(result) => f.debug_tuple("Finished").field(result).finish(),
            Launch::Running(_) => f.write_str("Running(..)"),
        }
    }
}

/// Creates engines for the three supported goal shapes.
pub trait EngineFactory {
    /// Search to a graph node, shifted by a local offset.
    fn to_node(
        &mut self,
        goal_node: NodeId,
        x_offset: f32,
        z_offset: f32,
        context: &SearchContext,
    ) -> Launch;

    /// Search to a waypoint of a course, shifted by a local offset.
    fn to_waypoint(
        &mut self,
        course: &Course,
        waypoint_index: usize,
        x_offset: f32,
        z_offset: f32,
        context: &SearchContext,
    ) -> Launch;

    /// Search to an arbitrary pose.
    fn to_goal(&mut self, goal: Pose2D, context: &SearchContext) -> Launch;
}

/// Which search a request runs, replayed on every retry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPoint {
    ToNode {
        goal_node: NodeId,
        x_offset: f32,
        z_offset: f32,
    },
    ToWaypoint {
        course: Course,
        waypoint_index: usize,
        x_offset: f32,
        z_offset: f32,
    },
    ToGoal {
        goal: Pose2D,
    },
}

impl EntryPoint {
    /// Start the search this entry point describes.
    pub fn launch(&self, factory: &mut dyn EngineFactory, context: &SearchContext) -> Launch {
        match self {
            EntryPoint::ToNode {
                goal_node,
                x_offset,
                z_offset,
            } => factory.to_node(*goal_node, *x_offset, *z_offset, context),
            EntryPoint::ToWaypoint {
                course,
                waypoint_index,
                x_offset,
                z_offset,
            } => factory.to_waypoint(course, *waypoint_index, *x_offset, *z_offset, context),
            EntryPoint::ToGoal { goal } => factory.to_goal(*goal, context),
        }
    }

    /// Short name for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::ToNode { .. } => "to-node",
            EntryPoint::ToWaypoint { .. } => "to-waypoint",
            EntryPoint::ToGoal { .. } => "to-goal",
        }
    }
}
