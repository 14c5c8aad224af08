//! Pose and point types in the world frame.
//!
//! The world frame is x/y on the ground plane. Local offsets follow the
//! vehicle convention: `x` is to the left of the heading, `z` is ahead.

use serde::{Deserialize, Serialize};

use super::math::normalize_angle;

/// A 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Pose in 2D space: position in meters, heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to [-π, π]
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to [-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Position part of the pose.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Shift the pose by a local offset, keeping the heading.
    ///
    /// `x_offset` moves to the left of the heading, `z_offset` moves ahead.
    pub fn offset_local(&self, x_offset: f32, z_offset: f32) -> Pose2D {
        let (sin, cos) = self.theta.sin_cos();
        Pose2D {
            x: self.x + z_offset * cos - x_offset * sin,
            y: self.y + z_offset * sin + x_offset * cos,
            theta: self.theta,
        }
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
