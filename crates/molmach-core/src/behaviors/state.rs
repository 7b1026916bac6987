use crate::engine::clock::SimTimer;
use std::fmt::Debug;

/// A closed set of states plus the time spent in the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMachine<S> {
    state: S,
    timer: SimTimer,
}

impl<S: Copy + Eq + Debug> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            timer: SimTimer::new(),
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn is(&self, state: S) -> bool {
        self.state == state
    }

    pub fn seconds_in_state(&self) -> f64 {
        self.timer.elapsed()
    }

    /// Switches state and restarts the clock, even when `state` is the current one.
    pub fn set_state(&mut self, state: S) {
        self.state = state;
        self.timer.reset();
    }

    pub fn advance(&mut self, dt: f64) {
        self.timer.advance(dt);
    }
}
