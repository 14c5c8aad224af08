//! Goal resolution for the grid engine.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::GridConfig;
use crate::context::SearchContext;
use crate::core::Pose2D;
use crate::course::Course;
use crate::engine::{EngineFactory, Launch, NodeId, StepResult};

use super::map::{Cell, TerrainGrid};
use super::search::GridSearch;

/// Starts [`GridSearch`]es from the vehicle pose.
///
/// Graph nodes are looked up in a registry filled by the caller. Goals that
/// cannot be resolved (unknown node, waypoint index past the course end,
/// outside the grid, inside a blocked cell) answer immediately with an
/// invalid goal.
pub struct GridEngineFactory {
    grid: Rc<TerrainGrid>,
    config: GridConfig,
    vehicle_pose: Pose2D,
    nodes: HashMap<NodeId, Pose2D>,
}

impl GridEngineFactory {
    pub fn new(grid: Rc<TerrainGrid>, config: GridConfig) -> Self {
        Self {
            grid,
            config,
            vehicle_pose: Pose2D::identity(),
            nodes: HashMap::new(),
        }
    }

    /// Pose searches start from.
    pub fn set_vehicle_pose(&mut self, pose: Pose2D) {
        self.vehicle_pose = pose;
    }

    pub fn vehicle_pose(&self) -> Pose2D {
        self.vehicle_pose
    }

    /// Make a node addressable by [`EngineFactory::to_node`].
    pub fn register_node(&mut self, id: NodeId, pose: Pose2D) {
        self.nodes.insert(id, pose);
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<Pose2D> {
        self.nodes.remove(&id)
    }

    fn launch_to(&self, goal: Pose2D, context: &SearchContext) -> Launch {
        let goal_coord = self.grid.world_to_grid(goal.position());
        match self.grid.get(goal_coord) {
            None | Some(Cell::Blocked) => {
                tracing::debug!(
                    "Goal ({:.2}, {:.2}) is outside the map or blocked",
                    goal.x,
                    goal.y
                );
                return Launch::Finished(StepResult::invalid_goal());
            }
            Some(_) => {}
        }

        let start = self.vehicle_pose;
        let start_coord = self.grid.world_to_grid(start.position());
        if self.grid.traversal_cost(start_coord, context).is_none() {
            tracing::debug!(
                "Start ({:.2}, {:.2}) is not traversable",
                start.x,
                start.y
            );
            return Launch::Finished(StepResult::not_found());
        }

        if start_coord == goal_coord {
            return Launch::Finished(StepResult::found(vec![start, goal]));
        }

        Launch::Running(Box::new(GridSearch::new(
            Rc::clone(&self.grid),
            context.clone(),
            start,
            goal,
            self.config.goal_tolerance_cells,
            self.config.allow_diagonal,
            self.config.expansions_per_step,
        )))
    }
}

impl EngineFactory for GridEngineFactory {
    fn to_node(
        &mut self,
        goal_node: NodeId,
        x_offset: f32,
        z_offset: f32,
        context: &SearchContext,
    ) -> Launch {
        match self.nodes.get(&goal_node) {
            Some(pose) => self.launch_to(pose.offset_local(x_offset, z_offset), context),
            None => {
                tracing::debug!("Goal node {:?} is not registered", goal_node);
                Launch::Finished(StepResult::invalid_goal())
            }
        }
    }

    fn to_waypoint(
        &mut self,
        course: &Course,
        waypoint_index: usize,
        x_offset: f32,
        z_offset: f32,
        context: &SearchContext,
    ) -> Launch {
        match course.waypoint(waypoint_index) {
            Some(wp) => self.launch_to(wp.pose().offset_local(x_offset, z_offset), context),
            None => {
                tracing::debug!(
                    "Waypoint {} is past the end of a {} waypoint course",
                    waypoint_index,
                    course.len()
                );
                Launch::Finished(StepResult::invalid_goal())
            }
        }
    }

    fn to_goal(&mut self, goal: Pose2D, context: &SearchContext) -> Launch {
        self.launch_to(goal, context)
    }
}
