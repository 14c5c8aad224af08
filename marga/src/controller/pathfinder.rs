//! Pathfinding request lifecycle.
//!
//! [`PathfinderController`] runs one search at a time on behalf of a caller:
//!
//! ```text
//!   find_path_to_*()          update() each tick
//!  ───────────────▶ Active ──────────────────┐
//!        ▲            │  engine done         │
//!        │            ▼                      │
//!        │        classify ── ValidPath ─────┼──▶ on_result(success) ──▶ Idle
//!        │            │                      │
//!        │            ├── InvalidGoal ───────┼──▶ on_result(failure) ──▶ Idle
//!        │            │                      │
//!        │            └── NoPathFound        │
//!        │                 │ budget left?    │
//!        │            yes  ▼       no ───────┴──▶ on_result(failure) ──▶ Idle
//!        └──────── on_retry(context)
//! ```
//!
//! Everything happens on the caller's thread: the engine is stepped once per
//! [`update`](PathfinderController::update), and callbacks run synchronously
//! from `update` or from the find call itself when the engine answers
//! immediately.

use crate::clock::{Clock, SystemClock};
use crate::context::SearchContext;
use crate::core::Pose2D;
use crate::course::Course;
use crate::debug::DebugVisualization;
use crate::engine::{EngineFactory, EntryPoint, Launch, NodeId, SearchEngine, StepResult};
use crate::error::ControllerError;

use super::callbacks::CallbackRegistration;
use super::outcome::{PathOutcome, PathfinderResult};

/// Controller execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No search running.
    #[default]
    Idle,
    /// Engine is being stepped.
    Active,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "IDLE",
            ControllerState::Active => "ACTIVE",
        }
    }
}

/// Motion override for whoever drives the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveData {
    /// Speed cap in m/s, `None` for no override.
    pub max_speed: Option<f32>,
}

impl DriveData {
    /// Hold the vehicle still.
    pub fn halt() -> Self {
        Self {
            max_speed: Some(0.0),
        }
    }

    pub fn none() -> Self {
        Self { max_speed: None }
    }
}

/// The logical request currently owned by the controller.
#[derive(Debug, Clone)]
struct Request {
    context: SearchContext,
    retry_budget: u32,
    /// Failed attempts so far, never above `retry_budget`
    fail_count: u32,
    started_at_ms: u64,
    entry_point: EntryPoint,
}

/// Runs pathfinding requests with retry on behalf of one caller.
pub struct PathfinderController<F: EngineFactory> {
    factory: F,
    clock: Box<dyn Clock>,
    callbacks: Option<CallbackRegistration<F>>,
    request: Option<Request>,
    engine: Option<Box<dyn SearchEngine>>,
    /// Entry point and budget of the most recent start, for `retry()`
    last_entry: Option<(EntryPoint, u32)>,
    /// Fail count to carry into the next start, set while a retry callback runs
    pending_fail_count: Option<u32>,
    /// Incremented on every start
    generation: u64,
    /// Set while the retry callback runs
    in_retry_callback: bool,
    /// Immediate result of a search restarted from the retry callback,
    /// finished by the caller of that callback
    pending_finish: Option<StepResult>,
}

impl<F: EngineFactory> PathfinderController<F> {
    /// Create a controller timed by the system clock.
    pub fn new(factory: F) -> Self {
        Self::with_clock(factory, SystemClock::new())
    }

    /// Create a controller with an injected clock.
    pub fn with_clock(factory: F, clock: impl Clock + 'static) -> Self {
        Self {
            factory,
            clock: Box::new(clock),
            callbacks: None,
            request: None,
            engine: None,
            last_entry: None,
            pending_fail_count: None,
            generation: 0,
            in_retry_callback: false,
            pending_finish: None,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Register the caller's callbacks, replacing any previous registration.
    pub fn register_callbacks(&mut self, callbacks: CallbackRegistration<F>) {
        tracing::debug!(
            "[{}] Callbacks registered (retry: {})",
            callbacks.owner,
            callbacks.has_retry()
        );
        self.callbacks = Some(callbacks);
    }

    fn owner(&self) -> &str {
        self.callbacks
            .as_ref()
            .map(|c| c.owner.as_str())
            .unwrap_or("unregistered")
    }

    fn ensure_callbacks(&self, call: &str) -> Result<(), ControllerError> {
        if self.callbacks.is_none() {
            tracing::error!("{}: no result callback registered, not starting", call);
            return Err(ControllerError::MissingCallback);
        }
        Ok(())
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Find a path to a graph node, shifted by a local offset.
    pub fn find_path_to_node(
        &mut self,
        context: SearchContext,
        goal_node: NodeId,
        x_offset: f32,
        z_offset: f32,
        retry_budget: u32,
    ) -> Result<(), ControllerError> {
        self.ensure_callbacks("find_path_to_node")?;
        self.start(
            context,
            retry_budget,
            EntryPoint::ToNode {
                goal_node,
                x_offset,
                z_offset,
            },
        );
        Ok(())
    }

    /// Find a path to a waypoint of a course, shifted by a local offset.
    pub fn find_path_to_waypoint(
        &mut self,
        context: SearchContext,
        course: &Course,
        waypoint_index: usize,
        x_offset: f32,
        z_offset: f32,
        retry_budget: u32,
    ) -> Result<(), ControllerError> {
        self.ensure_callbacks("find_path_to_waypoint")?;
        self.start(
            context,
            retry_budget,
            EntryPoint::ToWaypoint {
                course: course.clone(),
                waypoint_index,
                x_offset,
                z_offset,
            },
        );
        Ok(())
    }

    /// Find a path to an arbitrary pose.
    pub fn find_path_to_goal(
        &mut self,
        context: SearchContext,
        goal: Pose2D,
        retry_budget: u32,
    ) -> Result<(), ControllerError> {
        self.ensure_callbacks("find_path_to_goal")?;
        self.start(context, retry_budget, EntryPoint::ToGoal { goal });
        Ok(())
    }

    /// Run the most recent search again with a new context.
    ///
    /// Keeps the goal and retry budget of the last find call.
    pub fn retry(&mut self, context: SearchContext) -> Result<(), ControllerError> {
        let Some((entry_point, retry_budget)) = self.last_entry.clone() else {
            tracing::error!("[{}] retry: no pathfinding was started before", self.owner());
            return Err(ControllerError::NoPriorRequest);
        };
        self.ensure_callbacks("retry")?;
        self.start(context, retry_budget, entry_point);
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn start(&mut self, context: SearchContext, retry_budget: u32, entry_point: EntryPoint) {
        self.pending_finish = None;
        if self.engine.take().is_some() {
            tracing::warn!(
                "[{}] Starting {} search while another is running, dropping it",
                self.owner(),
                entry_point.as_str()
            );
        }

        let fail_count = self.pending_fail_count.take().unwrap_or(0).min(retry_budget);
        self.generation += 1;
        self.last_entry = Some((entry_point.clone(), retry_budget));

        tracing::debug!(
            "[{}] Start {} search (attempt {}, {} retries allowed): {}",
            self.owner(),
            entry_point.as_str(),
            fail_count + 1,
            retry_budget,
            context
        );

        let launch = entry_point.launch(&mut self.factory, &context);
        self.request = Some(Request {
            context,
            retry_budget,
            fail_count,
            started_at_ms: self.clock.now_ms(),
            entry_point,
        });

        match launch {
            Launch::Finished(result) if self.in_retry_callback => {
                tracing::debug!("[{}] Search finished immediately", self.owner());
                self.pending_finish = Some(result);
            }
            Launch::Finished(result) => {
                tracing::debug!("[{}] Search finished immediately", self.owner());
                self.finish(result);
            }
            Launch::Running(engine) => {
                tracing::debug!("[{}] Continuing search over ticks", self.owner());
                self.engine = Some(engine);
            }
        }
    }

    /// Advance the running search by one step. Call once per tick.
    pub fn update(&mut self, _dt: f32) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = engine.step();
        if result.done {
            self.finish(result);
        }
    }

    /// Classify a finished attempt and either retry or report.
    ///
    /// Searches restarted from the retry callback that answer immediately are
    /// handled by this loop instead of recursing, so a long chain of
    /// immediate failures runs in constant stack.
    fn finish(&mut self, mut result: StepResult) {
        loop {
            self.engine = None;
            let Some(mut request) = self.request.take() else {
                return;
            };

            let elapsed_ms = self.clock.now_ms().saturating_sub(request.started_at_ms);
            let outcome = PathOutcome::classify(result.path.as_deref(), result.goal_invalid);
            tracing::debug!(
                "[{}] {} search done in {} ms: {}",
                self.owner(),
                request.entry_point.as_str(),
                elapsed_ms,
                outcome.as_str()
            );

            let on_retry = self.callbacks.as_ref().and_then(|c| c.on_retry.clone());
            if outcome.is_retryable()
                && let Some(on_retry) = on_retry
                && request.fail_count < request.retry_budget
            {
                request.fail_count += 1;
                let attempt = request.fail_count;
                let is_last = attempt == request.retry_budget;
                tracing::info!(
                    "[{}] No path found, retry {} of {}",
                    self.owner(),
                    attempt,
                    request.retry_budget
                );

                let context = request.context.clone();
                self.request = Some(request);
                self.pending_fail_count = Some(attempt);
                let generation = self.generation;

                let outer = std::mem::replace(&mut self.in_retry_callback, true);
                on_retry(self, context, is_last, attempt);
                self.in_retry_callback = outer;

                if self.generation == generation {
                    // Nothing was restarted: the request ends here without a result.
                    tracing::debug!(
                        "[{}] Retry callback did not start a new search, dropping request",
                        self.owner()
                    );
                    self.request = None;
                    self.pending_fail_count = None;
                    return;
                }
                match self.pending_finish.take() {
                    Some(next) => {
                        result = next;
                        continue;
                    }
                    None => return,
                }
            }

            let success = outcome == PathOutcome::ValidPath;
            let course = if success {
                result.path.as_deref().map(Course::from_path)
            } else {
                None
            };
            let report = PathfinderResult {
                success,
                course,
                goal_invalid: if success { None } else { result.goal_invalid },
                elapsed_ms,
                retries: request.fail_count,
            };

            tracing::info!(
                "[{}] Pathfinding {} after {} ms ({} retries): {}",
                self.owner(),
                if success { "succeeded" } else { "failed" },
                elapsed_ms,
                request.fail_count,
                outcome.as_str()
            );

            self.reset();
            match self.callbacks.as_ref().map(|c| c.on_result.clone()) {
                Some(on_result) => on_result(self, report),
                None => tracing::warn!("Pathfinding result dropped, no callback registered"),
            }
            return;
        }
    }

    /// Cancel the running request without notifying the caller.
    pub fn reset(&mut self) {
        self.engine = None;
        self.request = None;
        self.pending_fail_count = None;
        self.pending_finish = None;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True while an engine is held.
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    pub fn state(&self) -> ControllerState {
        if self.is_active() {
            ControllerState::Active
        } else {
            ControllerState::Idle
        }
    }

    /// Context of the live request.
    pub fn current_context(&self) -> Option<&SearchContext> {
        self.request.as_ref().map(|r| &r.context)
    }

    /// Failed attempts of the live request.
    pub fn attempt_number(&self) -> u32 {
        self.request.as_ref().map(|r| r.fail_count).unwrap_or(0)
    }

    /// Hold the vehicle while a search runs.
    pub fn drive_data(&self) -> DriveData {
        if self.is_active() {
            DriveData::halt()
        } else {
            DriveData::none()
        }
    }

    /// Copy the running engine's debug nodes into `viz`.
    pub fn draw_nodes(&self, viz: &mut DebugVisualization) {
        if let Some(engine) = &self.engine {
            viz.search_nodes.extend(engine.debug_nodes());
        }
    }
}
