//! Test utilities for controller tests.
//!
//! Provides a scripted engine factory and recorders for callback traffic.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use marga::{
    CallbackRegistration, Course, EngineFactory, Launch, ManualClock, NodeId, PathfinderController,
    PathfinderResult, Point2D, Pose2D, SearchContext, SearchEngine, StepResult,
};

/// One scripted attempt: step count before finishing, and the final result.
///
/// `steps == 0` answers immediately from the factory.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub steps: u32,
    pub result: StepResult,
}

impl Attempt {
    pub fn immediate(result: StepResult) -> Self {
        Self { steps: 0, result }
    }

    pub fn after(steps: u32, result: StepResult) -> Self {
        Self { steps, result }
    }
}

/// Engine that reports `done` on its n-th step.
pub struct ScriptedEngine {
    remaining: u32,
    result: StepResult,
    steps_taken: Rc<RefCell<u32>>,
}

impl SearchEngine for ScriptedEngine {
    fn step(&mut self) -> StepResult {
        *self.steps_taken.borrow_mut() += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.result.clone()
        } else {
            StepResult::pending()
        }
    }

    fn is_running(&self) -> bool {
        self.remaining > 0
    }

    fn debug_nodes(&self) -> Vec<Point2D> {
        vec![Point2D::new(self.remaining as f32, 0.0)]
    }
}

/// What the factory was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum LaunchKind {
    Node(NodeId),
    Waypoint(usize),
    Goal,
}

/// Factory replaying [`Attempt`]s in order. The last attempt repeats.
pub struct ScriptedFactory {
    attempts: VecDeque<Attempt>,
    last: Option<Attempt>,
    /// Context and kind of every launch
    pub launches: Rc<RefCell<Vec<(LaunchKind, SearchContext)>>>,
    /// Engine steps across all launches
    pub steps_taken: Rc<RefCell<u32>>,
}

impl ScriptedFactory {
    pub fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: attempts.into(),
            last: None,
            launches: Rc::new(RefCell::new(Vec::new())),
            steps_taken: Rc::new(RefCell::new(0)),
        }
    }

    fn launch(&mut self, kind: LaunchKind, context: &SearchContext) -> Launch {
        self.launches.borrow_mut().push((kind, context.clone()));
        let attempt = match self.attempts.pop_front() {
            Some(a) => {
                self.last = Some(a.clone());
                a
            }
            None => self
                .last
                .clone()
                .unwrap_or_else(|| Attempt::immediate(StepResult::not_found())),
        };

        if attempt.steps == 0 {
            Launch::Finished(attempt.result)
        } else {
            Launch::Running(Box::new(ScriptedEngine {
                remaining: attempt.steps,
                result: attempt.result,
                steps_taken: Rc::clone(&self.steps_taken),
            }))
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.borrow().len()
    }
}

impl EngineFactory for ScriptedFactory {
    fn to_node(&mut self, goal_node: NodeId, _: f32, _: f32, context: &SearchContext) -> Launch {
        self.launch(LaunchKind::Node(goal_node), context)
    }

    fn to_waypoint(
        &mut self,
        _: &Course,
        waypoint_index: usize,
        _: f32,
        _: f32,
        context: &SearchContext,
    ) -> Launch {
        self.launch(LaunchKind::Waypoint(waypoint_index), context)
    }

    fn to_goal(&mut self, _: Pose2D, context: &SearchContext) -> Launch {
        self.launch(LaunchKind::Goal, context)
    }
}

pub type Controller = PathfinderController<ScriptedFactory>;

/// Create a controller over a scripted factory with a manual clock.
pub fn controller(attempts: Vec<Attempt>) -> (Controller, ManualClock) {
    let clock = ManualClock::new(0);
    (
        PathfinderController::with_clock(ScriptedFactory::new(attempts), clock.clone()),
        clock,
    )
}

/// Callback traffic seen by a registration.
#[derive(Default, Debug)]
pub struct Recorder {
    pub results: Vec<PathfinderResult>,
    /// (is_last_retry, attempt_number, context)
    pub retries: Vec<(bool, u32, SearchContext)>,
}

pub type SharedRecorder = Rc<RefCell<Recorder>>;

/// Registration that records results and, on retry, relaxes the fruit limit
/// by 10% and restarts through `retry()`.
pub fn relaxing_registration(owner: &str) -> (SharedRecorder, CallbackRegistration<ScriptedFactory>) {
    let recorder: SharedRecorder = Rc::default();
    let on_result = Rc::clone(&recorder);
    let on_retry = Rc::clone(&recorder);

    let reg = CallbackRegistration::new(owner, move |_: &mut Controller, result| {
        on_result.borrow_mut().results.push(result);
    })
    .with_retry(move |ctl: &mut Controller, context, is_last, attempt| {
        on_retry
            .borrow_mut()
            .retries
            .push((is_last, attempt, context.clone()));
        let relaxed = context.clone().max_fruit_percent(context.max_fruit_percent + 10.0);
        ctl.retry(relaxed).expect("retry after a started request");
    });

    (recorder, reg)
}

/// Registration that records results only.
pub fn result_only_registration(owner: &str) -> (SharedRecorder, CallbackRegistration<ScriptedFactory>) {
    let recorder: SharedRecorder = Rc::default();
    let on_result = Rc::clone(&recorder);
    let reg = CallbackRegistration::new(owner, move |_: &mut Controller, result| {
        on_result.borrow_mut().results.push(result);
    });
    (recorder, reg)
}

/// A path long enough to count as a route.
pub fn route(points: usize) -> Vec<Pose2D> {
    (0..points)
        .map(|i| Pose2D::new(i as f32, 0.0, 0.0))
        .collect()
}
