//! Outcome classification and the payload of the result callback.

use crate::core::Pose2D;
use crate::course::Course;

/// Minimum number of points for a path to count as a route.
///
/// A two-point path means start and goal coincide or the search degenerated.
pub const MIN_VALID_PATH_POINTS: usize = 3;

/// How a finished search is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// Path with more than two points.
    ValidPath,
    /// No usable path; retryable.
    NoPathFound,
    /// The goal could not be resolved; never retried.
    InvalidGoal,
}

impl PathOutcome {
    /// Classify an engine result.
    ///
    /// A usable path wins over the goal-invalid flag; the flag only matters
    /// when there is no usable path.
    pub fn classify(path: Option<&[Pose2D]>, goal_invalid: Option<bool>) -> Self {
        match path {
            Some(p) if p.len() >= MIN_VALID_PATH_POINTS => PathOutcome::ValidPath,
            _ if goal_invalid == Some(true) => PathOutcome::InvalidGoal,
            _ => PathOutcome::NoPathFound,
        }
    }

    /// Whether a retry may follow this outcome.
    pub fn is_retryable(&self) -> bool {
        *self == PathOutcome::NoPathFound
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathOutcome::ValidPath => "VALID_PATH",
            PathOutcome::NoPathFound => "NO_PATH_FOUND",
            PathOutcome::InvalidGoal => "INVALID_GOAL",
        }
    }
}

/// Terminal notification for one logical request.
#[derive(Debug, Clone, PartialEq)]
pub struct PathfinderResult {
    /// A valid path was found.
    pub success: bool,
    /// The found path as a course, present only on success.
    pub course: Option<Course>,
    /// Goal-invalid flag as the engine reported it, `None` on success.
    pub goal_invalid: Option<bool>,
    /// Duration of the last attempt in milliseconds. Advisory.
    pub elapsed_ms: u64,
    /// Retries consumed before this result.
    pub retries: u32,
}

impl PathfinderResult {
    pub fn outcome(&self) -> PathOutcome {
        if self.success {
            PathOutcome::ValidPath
        } else if self.goal_invalid == Some(true) {
            PathOutcome::InvalidGoal
        } else {
            PathOutcome::NoPathFound
        }
    }
}
