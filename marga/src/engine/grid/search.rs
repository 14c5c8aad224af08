//! Resumable A* search.
//!
//! Each [`SearchEngine::step`] expands at most `expansions_per_step` nodes and
//! then returns, keeping the open set for the next tick.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::rc::Rc;

use crate::context::SearchContext;
use crate::core::{Point2D, Pose2D};
use crate::engine::{SearchEngine, StepResult};

use super::map::{GridCoord, TerrainGrid};

const NEIGHBORS_4: [GridCoord; 4] = [
    GridCoord::new(-1, 0),
    GridCoord::new(1, 0),
    GridCoord::new(0, -1),
    GridCoord::new(0, 1),
];

const NEIGHBORS_8: [GridCoord; 8] = [
    GridCoord::new(-1, 0),
    GridCoord::new(1, 0),
    GridCoord::new(0, -1),
    GridCoord::new(0, 1),
    GridCoord::new(-1, -1),
    GridCoord::new(1, -1),
    GridCoord::new(-1, 1),
    GridCoord::new(1, 1),
];

/// Node in the open set.
#[derive(Clone, Debug)]
struct SearchNode {
    coord: GridCoord,
    f_score: f32,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority)
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search in progress.
pub struct GridSearch {
    grid: Rc<TerrainGrid>,
    context: SearchContext,
    start: Pose2D,
    goal: Pose2D,
    goal_coord: GridCoord,
    goal_tolerance: i32,
    allow_diagonal: bool,
    expansions_per_step: usize,

    open_set: BinaryHeap<SearchNode>,
    g_score: HashMap<GridCoord, f32>,
    parent: HashMap<GridCoord, GridCoord>,
    closed_set: HashSet<GridCoord>,
    iterations: usize,
    running: bool,
    result: Option<StepResult>,
}

impl GridSearch {
    /// Set up a search; no nodes are expanded until the first step.
    ///
    /// `goal_tolerance` is ignored when the context asks for accuracy.
    pub fn new(
        grid: Rc<TerrainGrid>,
        context: SearchContext,
        start: Pose2D,
        goal: Pose2D,
        goal_tolerance: i32,
        allow_diagonal: bool,
        expansions_per_step: usize,
    ) -> Self {
        let start_coord = grid.world_to_grid(start.position());
        let goal_coord = grid.world_to_grid(goal.position());
        let goal_tolerance = if context.must_be_accurate {
            0
        } else {
            goal_tolerance.max(0)
        };

        let mut open_set = BinaryHeap::new();
        let mut g_score = HashMap::new();
        let mut parent = HashMap::new();
        g_score.insert(start_coord, 0.0);
        parent.insert(start_coord, start_coord);
        open_set.push(SearchNode {
            coord: start_coord,
            f_score: Self::heuristic(start_coord, goal_coord),
        });

        Self {
            grid,
            context,
            start,
            goal,
            goal_coord,
            goal_tolerance,
            allow_diagonal,
            expansions_per_step: expansions_per_step.max(1),
            open_set,
            g_score,
            parent,
            closed_set: HashSet::new(),
            iterations: 0,
            running: true,
            result: None,
        }
    }

    /// Nodes expanded so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[inline]
    fn heuristic(from: GridCoord, to: GridCoord) -> f32 {
        let dx = (to.x - from.x) as f32;
        let dy = (to.y - from.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    fn finish(&mut self, result: StepResult) -> StepResult {
        self.running = false;
        self.open_set.clear();
        self.result = Some(result.clone());
        result
    }

    fn expand(&mut self, current: GridCoord) {
        let current_g = *self.g_score.get(&current).unwrap_or(&f32::MAX);
        let neighbors: &[GridCoord] = if self.allow_diagonal {
            &NEIGHBORS_8
        } else {
            &NEIGHBORS_4
        };

        for offset in neighbors {
            let neighbor = GridCoord::new(current.x + offset.x, current.y + offset.y);
            if self.closed_set.contains(&neighbor) {
                continue;
            }
            let Some(cost) = self.grid.traversal_cost(neighbor, &self.context) else {
                continue;
            };

            let distance = if offset.x != 0 && offset.y != 0 {
                std::f32::consts::SQRT_2
            } else {
                1.0
            };
            let new_g = current_g + distance * cost;

            if new_g < *self.g_score.get(&neighbor).unwrap_or(&f32::MAX) {
                self.g_score.insert(neighbor, new_g);
                self.parent.insert(neighbor, current);
                self.open_set.push(SearchNode {
                    coord: neighbor,
                    f_score: new_g + Self::heuristic(neighbor, self.goal_coord),
                });
            }
        }
    }

    /// Walk parents back from `end` and turn cells into poses.
    ///
    /// The first cell is replaced by the exact start, and the last one by the
    /// exact goal when the search ended in the goal cell.
    fn reconstruct_path(&self, end: GridCoord) -> Vec<Pose2D> {
        let mut coords = Vec::new();
        let mut current = end;
        loop {
            coords.push(current);
            match self.parent.get(&current) {
                Some(&p) if p != current => current = p,
                _ => break,
            }
        }
        coords.reverse();

        let mut points: Vec<Point2D> = coords
            .iter()
            .map(|&c| self.grid.grid_to_world(c))
            .collect();
        if let Some(first) = points.first_mut() {
            *first = self.start.position();
        }
        if points.len() > 1
            && end == self.goal_coord
            && let Some(last) = points.last_mut()
        {
            *last = self.goal.position();
        }

        let n = points.len();
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let theta = if i + 1 < n {
                    (points[i + 1].y - p.y).atan2(points[i + 1].x - p.x)
                } else {
                    self.goal.theta
                };
                Pose2D::new(p.x, p.y, theta)
            })
            .collect()
    }
}

impl SearchEngine for GridSearch {
    fn step(&mut self) -> StepResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        for _ in 0..self.expansions_per_step {
            let Some(node) = self.open_set.pop() else {
                tracing::debug!("Open set exhausted after {} iterations", self.iterations);
                return self.finish(StepResult::not_found());
            };
            let current = node.coord;
            if self.closed_set.contains(&current) {
                continue;
            }

            self.iterations += 1;
            if self.iterations > self.context.max_iterations {
                tracing::debug!("Search exceeded {} iterations", self.context.max_iterations);
                return self.finish(StepResult::not_found());
            }

            if current.chebyshev_distance(&self.goal_coord) <= self.goal_tolerance {
                let path = self.reconstruct_path(current);
                tracing::debug!(
                    "Path found: {} points after {} iterations",
                    path.len(),
                    self.iterations
                );
                return self.finish(StepResult::found(path));
            }

            self.closed_set.insert(current);
            self.expand(current);
        }

        StepResult::pending()
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn debug_nodes(&self) -> Vec<Point2D> {
        self.open_set
            .iter()
            .map(|n| self.grid.grid_to_world(n.coord))
            .collect()
    }
}
