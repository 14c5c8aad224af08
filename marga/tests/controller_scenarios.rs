//! Request lifecycle scenarios against a scripted engine.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{
    Attempt, Controller, LaunchKind, controller, relaxing_registration, result_only_registration,
    route,
};
use marga::{
    CallbackRegistration, ControllerError, ControllerState, Course, CourseWaypoint, NodeId,
    PathOutcome, Pose2D, SearchContext, StepResult,
};

#[test]
fn test_immediate_valid_path_succeeds() {
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::found(route(4)))]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    assert!(
        ctl.find_path_to_node(SearchContext::default(), NodeId(1), 0.0, 0.0, 0)
            .is_ok()
    );

    let rec = rec.borrow();
    assert!(rec.retries.is_empty());
    assert_eq!(rec.results.len(), 1);
    let result = &rec.results[0];
    assert!(result.success);
    assert_eq!(result.goal_invalid, None);
    assert_eq!(result.course.as_ref().map(Course::len), Some(4));
    assert_eq!(result.outcome(), PathOutcome::ValidPath);

    assert_eq!(ctl.state(), ControllerState::Idle);
    assert!(ctl.current_context().is_none());
}

#[test]
fn test_retries_until_budget_exhausted() {
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::not_found())]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::new(5.0, 5.0, 0.0), 2)
        .unwrap();

    let rec = rec.borrow();
    let retries: Vec<(bool, u32)> = rec.retries.iter().map(|(l, a, _)| (*l, *a)).collect();
    assert_eq!(retries, vec![(false, 1), (true, 2)]);

    assert_eq!(rec.results.len(), 1);
    assert!(!rec.results[0].success);
    assert_eq!(rec.results[0].goal_invalid, Some(false));
    assert!(rec.results[0].course.is_none());
    assert_eq!(rec.results[0].retries, 2);

    assert_eq!(ctl.factory().launch_count(), 3);
    assert!(!ctl.is_active());
}

#[test]
fn test_invalid_goal_is_never_retried() {
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::invalid_goal())]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_node(SearchContext::default(), NodeId(9), 0.0, 0.0, 2)
        .unwrap();

    let rec = rec.borrow();
    assert!(rec.retries.is_empty());
    assert_eq!(rec.results.len(), 1);
    assert!(!rec.results[0].success);
    assert_eq!(rec.results[0].goal_invalid, Some(true));
    assert_eq!(ctl.factory().launch_count(), 1);
}

#[test]
fn test_find_without_callbacks_is_rejected() {
    let (mut ctl, _) = controller(vec![Attempt::after(3, StepResult::found(route(4)))]);

    assert_eq!(
        ctl.find_path_to_node(SearchContext::default(), NodeId(1), 0.0, 0.0, 0),
        Err(ControllerError::MissingCallback)
    );
    let course = Course::new(vec![CourseWaypoint::new(1.0, 1.0, 0.0)]);
    assert_eq!(
        ctl.find_path_to_waypoint(SearchContext::default(), &course, 0, 0.0, 0.0, 0),
        Err(ControllerError::MissingCallback)
    );
    assert_eq!(
        ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 0),
        Err(ControllerError::MissingCallback)
    );

    assert_eq!(ctl.factory().launch_count(), 0);
    assert!(!ctl.is_active());
}

#[test]
fn test_multi_tick_search_active_window() {
    let (mut ctl, _) = controller(vec![Attempt::after(5, StepResult::found(route(6)))]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::new(3.0, 0.0, 0.0), 0)
        .unwrap();
    assert!(ctl.is_active());

    for tick in 1..=8 {
        ctl.update(0.05);
        let fired = rec.borrow().results.len();
        if tick < 5 {
            assert!(ctl.is_active(), "tick {}", tick);
            assert_eq!(fired, 0, "tick {}", tick);
        } else {
            assert!(!ctl.is_active(), "tick {}", tick);
            assert_eq!(fired, 1, "tick {}", tick);
        }
    }

    assert_eq!(*ctl.factory().steps_taken.borrow(), 5);
    assert!(rec.borrow().results[0].success);
}

#[test]
fn test_retry_count_matches_budget() {
    for budget in 0..5u32 {
        let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::not_found())]);
        let (rec, reg) = relaxing_registration("tractor");
        ctl.register_callbacks(reg);

        ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), budget)
            .unwrap();

        let rec = rec.borrow();
        assert_eq!(rec.retries.len() as u32, budget);
        for (is_last, attempt, _) in &rec.retries {
            assert_eq!(*is_last, *attempt == budget);
        }
        assert_eq!(rec.results.len(), 1);
    }
}

#[test]
fn test_retry_over_ticks_hands_back_context() {
    let (mut ctl, _) = controller(vec![
        Attempt::after(2, StepResult::not_found()),
        Attempt::after(2, StepResult::not_found()),
        Attempt::after(3, StepResult::found(route(5))),
    ]);
    let (rec, reg) = relaxing_registration("combine");
    ctl.register_callbacks(reg);

    let ctx = SearchContext::default().max_fruit_percent(5.0);
    ctl.find_path_to_node(ctx, NodeId(4), 1.0, -2.0, 3).unwrap();

    let mut ticks = 0;
    while ctl.is_active() {
        ctl.update(0.05);
        ticks += 1;
        assert!(ticks < 20);
    }
    assert_eq!(ticks, 7);

    let rec = rec.borrow();
    assert_eq!(rec.retries.len(), 2);
    assert!((rec.retries[0].2.max_fruit_percent - 5.0).abs() < 1e-6);
    assert!((rec.retries[1].2.max_fruit_percent - 15.0).abs() < 1e-6);
    assert_eq!(rec.results.len(), 1);
    assert!(rec.results[0].success);
    assert_eq!(rec.results[0].retries, 2);

    let launches = ctl.factory().launches.borrow();
    assert!(launches.iter().all(|(kind, _)| *kind == LaunchKind::Node(NodeId(4))));
    let fruit: Vec<f32> = launches.iter().map(|(_, c)| c.max_fruit_percent).collect();
    assert_eq!(fruit, vec![5.0, 15.0, 25.0]);
}

#[test]
fn test_invalid_goal_after_retry_ends_request() {
    let (mut ctl, _) = controller(vec![
        Attempt::immediate(StepResult::not_found()),
        Attempt::immediate(StepResult::invalid_goal()),
    ]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 3)
        .unwrap();

    let rec = rec.borrow();
    assert_eq!(rec.retries.len(), 1);
    assert_eq!(rec.results.len(), 1);
    assert_eq!(rec.results[0].goal_invalid, Some(true));
    assert_eq!(rec.results[0].outcome(), PathOutcome::InvalidGoal);
}

#[test]
fn test_two_point_path_counts_as_failure() {
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::found(route(2)))]);
    let (rec, reg) = result_only_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 2)
        .unwrap();

    let rec = rec.borrow();
    assert_eq!(rec.results.len(), 1);
    assert!(!rec.results[0].success);
    assert!(rec.results[0].course.is_none());
    // No retry callback registered: budget is irrelevant
    assert_eq!(ctl.factory().launch_count(), 1);
}

#[test]
fn test_registration_replaces_previous() {
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::found(route(4)))]);
    let (first, reg_a) = result_only_registration("first");
    let (second, reg_b) = result_only_registration("second");
    ctl.register_callbacks(reg_a);
    ctl.register_callbacks(reg_b);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 0)
        .unwrap();

    assert!(first.borrow().results.is_empty());
    assert_eq!(second.borrow().results.len(), 1);
}

#[test]
fn test_retry_callback_that_does_not_restart_drops_request() {
    let (mut ctl, _) = controller(vec![
        Attempt::immediate(StepResult::not_found()),
        Attempt::immediate(StepResult::not_found()),
    ]);
    let results = Rc::new(RefCell::new(0u32));
    let retries = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&results);
    let q = Rc::clone(&retries);
    ctl.register_callbacks(
        CallbackRegistration::new("idle", move |_: &mut Controller, _| *r.borrow_mut() += 1)
            .with_retry(move |_: &mut Controller, _, is_last, attempt| {
                q.borrow_mut().push((is_last, attempt))
            }),
    );

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 2)
        .unwrap();
    assert_eq!(*results.borrow(), 0);
    assert_eq!(*retries.borrow(), vec![(false, 1)]);
    assert!(!ctl.is_active());
    assert!(ctl.current_context().is_none());

    // A fresh request starts counting from zero again
    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 2)
        .unwrap();
    assert_eq!(*retries.borrow(), vec![(false, 1), (false, 1)]);
}

#[test]
fn test_retry_callback_can_use_find_entry_point() {
    let (mut ctl, _) = controller(vec![
        Attempt::immediate(StepResult::not_found()),
        Attempt::after(1, StepResult::found(route(3))),
    ]);
    let results = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&results);
    let course = Course::new(vec![
        CourseWaypoint::new(0.0, 0.0, 0.0),
        CourseWaypoint::new(10.0, 0.0, 0.0),
    ]);
    let retry_course = course.clone();
    ctl.register_callbacks(
        CallbackRegistration::new("loader", move |_: &mut Controller, res| r.borrow_mut().push(res))
            .with_retry(move |ctl: &mut Controller, ctx, _, attempt| {
                assert_eq!(ctl.attempt_number(), attempt);
                assert!(ctl.current_context().is_some());
                ctl.find_path_to_waypoint(ctx.allow_reverse(true), &retry_course, 1, 0.0, 0.0, 1)
                    .unwrap();
            }),
    );

    ctl.find_path_to_waypoint(SearchContext::default(), &course, 1, 0.0, 0.0, 1)
        .unwrap();
    assert!(ctl.is_active());
    assert!(ctl.current_context().unwrap().allow_reverse);
    assert_eq!(ctl.attempt_number(), 1);

    ctl.update(0.1);
    assert!(!ctl.is_active());
    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].retries, 1);
}

#[test]
fn test_result_callback_can_chain_next_request() {
    let (mut ctl, _) = controller(vec![
        Attempt::immediate(StepResult::found(route(4))),
        Attempt::after(2, StepResult::found(route(4))),
    ]);
    let count = Rc::new(RefCell::new(0u32));
    let c = Rc::clone(&count);
    ctl.register_callbacks(CallbackRegistration::new(
        "chain",
        move |ctl: &mut Controller, _| {
            let n = {
                let mut n = c.borrow_mut();
                *n += 1;
                *n
            };
            if n == 1 {
                ctl.find_path_to_node(SearchContext::default(), NodeId(2), 0.0, 0.0, 0)
                    .unwrap();
            }
        },
    ));

    ctl.find_path_to_node(SearchContext::default(), NodeId(1), 0.0, 0.0, 0)
        .unwrap();
    assert_eq!(*count.borrow(), 1);
    assert!(ctl.is_active());

    ctl.update(0.1);
    ctl.update(0.1);
    assert_eq!(*count.borrow(), 2);
    assert!(!ctl.is_active());
}

#[test]
fn test_update_while_idle_is_noop() {
    let (mut ctl, _) = controller(vec![]);
    let (rec, reg) = result_only_registration("tractor");
    ctl.register_callbacks(reg);

    for _ in 0..5 {
        ctl.update(0.1);
    }
    assert!(rec.borrow().results.is_empty());
    assert_eq!(*ctl.factory().steps_taken.borrow(), 0);
}

#[test]
fn test_long_chain_of_immediate_failures() {
    let budget = 100_000;
    let (mut ctl, _) = controller(vec![Attempt::immediate(StepResult::not_found())]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), budget)
        .unwrap();

    let rec = rec.borrow();
    assert_eq!(rec.retries.len() as u32, budget);
    assert!(rec.retries.iter().rev().skip(1).all(|(is_last, _, _)| !is_last));
    assert_eq!(rec.retries.last().map(|(l, a, _)| (*l, *a)), Some((true, budget)));
    assert_eq!(rec.results.len(), 1);
    assert_eq!(rec.results[0].retries, budget);
    assert_eq!(ctl.factory().launch_count() as u32, budget + 1);
    assert!(!ctl.is_active());
}

#[test]
fn test_immediate_failures_then_multi_tick_success() {
    let (mut ctl, _) = controller(vec![
        Attempt::immediate(StepResult::not_found()),
        Attempt::immediate(StepResult::not_found()),
        Attempt::immediate(StepResult::not_found()),
        Attempt::after(2, StepResult::found(route(5))),
    ]);
    let (rec, reg) = relaxing_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 5)
        .unwrap();
    assert!(ctl.is_active());
    assert_eq!(ctl.attempt_number(), 3);
    assert_eq!(rec.borrow().retries.len(), 3);

    ctl.update(0.1);
    ctl.update(0.1);

    let rec = rec.borrow();
    assert_eq!(rec.results.len(), 1);
    assert!(rec.results[0].success);
    assert_eq!(rec.results[0].retries, 3);
}

#[test]
fn test_success_reports_no_goal_invalid_flag() {
    let found_with_flag = StepResult {
        done: true,
        path: Some(route(4)),
        goal_invalid: Some(true),
    };
    let (mut ctl, _) = controller(vec![Attempt::immediate(found_with_flag)]);
    let (rec, reg) = result_only_registration("tractor");
    ctl.register_callbacks(reg);

    ctl.find_path_to_goal(SearchContext::default(), Pose2D::identity(), 0)
        .unwrap();

    let rec = rec.borrow();
    assert_eq!(rec.results.len(), 1);
    assert!(rec.results[0].success);
    assert_eq!(rec.results[0].goal_invalid, None);
    assert_eq!(rec.results[0].outcome(), PathOutcome::ValidPath);
}
