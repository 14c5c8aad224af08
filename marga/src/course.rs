//! Drivable course produced from a found path.
//!
//! A [`Course`] is what the caller receives on success: the raw pose sequence
//! from the search engine turned into waypoints. Courses are also used as
//! input for [`EntryPoint::ToWaypoint`](crate::engine::EntryPoint) searches.

use serde::{Deserialize, Serialize};

use crate::core::{Point2D, Pose2D};

/// A waypoint along a course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseWaypoint {
    /// X coordinate in meters.
    pub x: f32,
    /// Y coordinate in meters.
    pub y: f32,
    /// Heading in radians when passing the waypoint.
    pub heading: f32,
    /// Driven in reverse.
    #[serde(default)]
    pub reverse: bool,
}

impl CourseWaypoint {
    #[inline]
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self {
            x,
            y,
            heading,
            reverse: false,
        }
    }

    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    #[inline]
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.heading)
    }
}

impl From<Pose2D> for CourseWaypoint {
    fn from(pose: Pose2D) -> Self {
        Self::new(pose.x, pose.y, pose.theta)
    }
}

/// An ordered list of waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    waypoints: Vec<CourseWaypoint>,
}

impl Course {
    pub fn new(waypoints: Vec<CourseWaypoint>) -> Self {
        Self { waypoints }
    }

    /// Convert a search result into a course.
    ///
    /// Headings are taken from the path poses, except where two consecutive
    /// poses differ in position, in which case the waypoint faces the next one.
    pub fn from_path(path: &[Pose2D]) -> Self {
        let waypoints = path
            .iter()
            .enumerate()
            .map(|(i, pose)| {
                let heading = match path.get(i + 1) {
                    Some(next) if next.position().distance_squared(&pose.position()) > 1e-8 => {
                        (next.y - pose.y).atan2(next.x - pose.x)
                    }
                    _ => pose.theta,
                };
                CourseWaypoint::new(pose.x, pose.y, heading)
            })
            .collect();
        Self { waypoints }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get a waypoint by index.
    #[inline]
    pub fn waypoint(&self, index: usize) -> Option<&CourseWaypoint> {
        self.waypoints.get(index)
    }

    pub fn waypoints(&self) -> &[CourseWaypoint] {
        &self.waypoints
    }

    pub fn first(&self) -> Option<&CourseWaypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&CourseWaypoint> {
        self.waypoints.last()
    }

    /// Total course length in meters.
    pub fn total_length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].position().distance(&w[1].position()))
            .sum()
    }
}
