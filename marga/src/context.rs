//! Search constraints handed to the engine.
//!
//! The controller treats a [`SearchContext`] as opaque state: it stores it,
//! passes it to the engine factory, and hands it back to the caller's retry
//! callback so the caller can relax constraints before the next attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ContextConfig;
use crate::core::Point2D;
use crate::engine::NodeId;

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub min: Point2D,
    pub max: Point2D,
}

impl Area {
    /// Create an area from two opposite corners in any order.
    pub fn new(a: Point2D, b: Point2D) -> Self {
        Self {
            min: Point2D::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2D::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    #[inline]
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Constraints for one pathfinding attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    /// Highest fruit density (percent) a path may cross.
    pub max_fruit_percent: f32,
    /// Cost multiplier for cells outside the field.
    pub off_field_penalty: f32,
    /// Restrict off-field penalty to this field, if set.
    pub use_field_num: Option<u32>,
    /// Cells inside this area are never entered.
    pub area_to_avoid: Option<Area>,
    /// Allow reverse segments in the result.
    pub allow_reverse: bool,
    /// Require the path to end exactly at the goal.
    pub must_be_accurate: bool,
    /// Node expansions allowed before giving up.
    pub max_iterations: usize,
    /// Treat harvested fruit heaps as free.
    pub ignore_fruit_heaps: bool,
    /// Nodes whose collision footprint is ignored.
    pub objects_to_ignore: Vec<NodeId>,
}

impl SearchContext {
    /// Create a context from configured defaults.
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            max_fruit_percent: config.max_fruit_percent,
            off_field_penalty: config.off_field_penalty,
            use_field_num: None,
            area_to_avoid: None,
            allow_reverse: config.allow_reverse,
            must_be_accurate: config.must_be_accurate,
            max_iterations: config.max_iterations,
            ignore_fruit_heaps: config.ignore_fruit_heaps,
            objects_to_ignore: Vec::new(),
        }
    }

    pub fn max_fruit_percent(mut self, percent: f32) -> Self {
        self.max_fruit_percent = percent;
        self
    }

    pub fn off_field_penalty(mut self, penalty: f32) -> Self {
        self.off_field_penalty = penalty;
        self
    }

    pub fn use_field_num(mut self, field: Option<u32>) -> Self {
        self.use_field_num = field;
        self
    }

    pub fn area_to_avoid(mut self, area: Option<Area>) -> Self {
        self.area_to_avoid = area;
        self
    }

    pub fn allow_reverse(mut self, allow: bool) -> Self {
        self.allow_reverse = allow;
        self
    }

    pub fn must_be_accurate(mut self, accurate: bool) -> Self {
        self.must_be_accurate = accurate;
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn ignore_fruit_heaps(mut self, ignore: bool) -> Self {
        self.ignore_fruit_heaps = ignore;
        self
    }

    pub fn objects_to_ignore(mut self, nodes: Vec<NodeId>) -> Self {
        self.objects_to_ignore = nodes;
        self
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fruit<={:.0}% offField={:.1} field={:?} avoid={} reverse={} accurate={} maxIter={} ignoreHeaps={} ignored={}",
            self.max_fruit_percent,
            self.off_field_penalty,
            self.use_field_num,
            self.area_to_avoid.is_some(),
            self.allow_reverse,
            self.must_be_accurate,
            self.max_iterations,
            self.ignore_fruit_heaps,
            self.objects_to_ignore.len()
        )
    }
}
