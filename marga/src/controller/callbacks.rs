//! Caller callbacks.
//!
//! Callbacks get the controller back as their first argument, so they can
//! start the next search (typically from the retry callback). They are kept
//! behind `Rc` and cloned out before each call, which makes re-entrant calls
//! into the controller safe.

use std::fmt;
use std::rc::Rc;

use crate::context::SearchContext;
use crate::engine::EngineFactory;

use super::outcome::PathfinderResult;
use super::pathfinder::PathfinderController;

/// Receives the terminal result of a request.
pub type ResultCallback<F> = Rc<dyn Fn(&mut PathfinderController<F>, PathfinderResult)>;

/// Asked for new parameters after a failed attempt.
///
/// Arguments: controller, context of the failed attempt, whether this is the
/// last retry, and the attempt number (1-based). The callback is expected to
/// start a new search before returning; otherwise the request is dropped.
pub type RetryCallback<F> = Rc<dyn Fn(&mut PathfinderController<F>, SearchContext, bool, u32)>;

/// Callbacks of one caller.
pub struct CallbackRegistration<F: EngineFactory> {
    /// Label of the caller, used in log lines.
    pub owner: String,
    pub(crate) on_result: ResultCallback<F>,
    pub(crate) on_retry: Option<RetryCallback<F>>,
}

impl<F: EngineFactory> CallbackRegistration<F> {
    pub fn new(
        owner: impl Into<String>,
        on_result: impl Fn(&mut PathfinderController<F>, PathfinderResult) + 'static,
    ) -> Self {
        Self {
            owner: owner.into(),
            on_result: Rc::new(on_result),
            on_retry: None,
        }
    }

    /// Add a retry callback.
    pub fn with_retry(
        mut self,
        on_retry: impl Fn(&mut PathfinderController<F>, SearchContext, bool, u32) + 'static,
    ) -> Self {
        self.on_retry = Some(Rc::new(on_retry));
        self
    }

    pub fn has_retry(&self) -> bool {
        self.on_retry.is_some()
    }
}

impl<F: EngineFactory> fmt::Debug for CallbackRegistration<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistration")
            .field("owner", &self.owner)
            .field("has_retry", &self.has_retry())
            .finish()
    }
}
