//! Chain state machine
//!
//! One `Chain` exists per top-level call of an installed operation. It moves
//! through `Before(i)` → `Target` → `After(j)` → `Finished`, driven by the
//! events that continuations and the target's completion produce.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::core::Outcome;
use crate::hooks::{HookFn, Operation, Phase};

/// The caller's terminal receiver
pub(crate) type Receiver = Box<dyn FnOnce(Outcome) + Send>;

/// Where a chain currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Waiting on the before-hook at this index
    Before(usize),
    /// Waiting on the target's completion
    Target,
    /// Waiting on the after-hook at this index
    After(usize),
    /// Delivered to the receiver
    Finished,
}

/// Signals fed back into a chain
#[derive(Debug)]
pub(crate) enum Event {
    /// A hook continued; `Some` replaces the current values
    Advance(Option<Vec<Value>>),
    /// A hook reported an error
    Abort(anyhow::Error),
    /// The target completed
    Complete(Outcome),
}

impl Event {
    /// Classify a continuation call `(err, ...values)`
    pub(crate) fn from_resume(error: Option<anyhow::Error>, values: Vec<Value>) -> Self {
        match error {
            Some(err) => Event::Abort(err),
            None if values.is_empty() => Event::Advance(None),
            None => Event::Advance(Some(values)),
        }
    }
}

/// What the driver has to do next
#[derive(Debug)]
pub(crate) enum Action {
    /// Run the hook at `index` of the `phase` chain
    RunHook(Phase, usize),
    /// Run the wrapped operation with the current values
    RunTarget,
    /// Hand the outcome to the receiver
    Deliver(Outcome),
    /// Nothing to do (event arrived in a state that cannot accept it)
    Ignore,
}

pub(crate) struct Chain<H> {
    pub(crate) id: Uuid,
    pub(crate) method: String,
    pub(crate) host: Arc<H>,
    pub(crate) target: Operation<H>,
    before: Arc<[HookFn<H>]>,
    after: Arc<[HookFn<H>]>,
    receiver: Option<Receiver>,
    state: State,
    /// Current argument vector, then current result vector
    pub(crate) values: Vec<Value>,
    trace: bool,
}

impl<H> Chain<H> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        method: impl Into<String>,
        host: Arc<H>,
        target: Operation<H>,
        before: Arc<[HookFn<H>]>,
        after: Arc<[HookFn<H>]>,
        args: Vec<Value>,
        receiver: Receiver,
        trace: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.into(),
            host,
            target,
            before,
            after,
            receiver: Some(receiver),
            state: State::Before(0),
            values: args,
            trace,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn hook(&self, phase: Phase, index: usize) -> Option<&HookFn<H>> {
        match phase {
            Phase::Before => self.before.get(index),
            Phase::After => self.after.get(index),
        }
    }

    /// Enter the first state
    pub(crate) fn start(&mut self) -> Action {
        self.enter_before(0)
    }

    /// Apply an event and return the resulting action
    pub(crate) fn step(&mut self, event: Event) -> Action {
        let action = match (self.state, event) {
            (State::Finished, event) => {
                tracing::warn!(chain = %self.id, method = %self.method, "[Chain] Event after delivery ignored: {:?}", event);
                Action::Ignore
            }
            (state, Event::Abort(err)) => {
                tracing::debug!(chain = %self.id, method = %self.method, "[Chain] Aborted in {:?}: {}", state, err);
                self.finish(Outcome::err(err))
            }
            (State::Before(i), Event::Advance(values)) => {
                if let Some(values) = values {
                    self.values = values;
                }
                self.enter_before(i + 1)
            }
            (State::Target, Event::Complete(outcome)) => match outcome.error {
                Some(err) => {
                    tracing::debug!(chain = %self.id, method = %self.method, "[Chain] Target failed, skipping after-hooks: {}", err);
                    self.finish(Outcome::err(err))
                }
                None => {
                    self.values = outcome.values;
                    self.enter_after(0)
                }
            },
            (State::After(j), Event::Advance(values)) => {
                if let Some(values) = values {
                    self.values = values;
                }
                self.enter_after(j + 1)
            }
            (state, event) => {
                tracing::warn!(chain = %self.id, method = %self.method, "[Chain] Unexpected event in {:?}: {:?}", state, event);
                Action::Ignore
            }
        };

        if self.trace {
            tracing::debug!(chain = %self.id, method = %self.method, state = ?self.state, "[Chain] Transition");
        }

        action
    }

    /// Hand the outcome to the receiver (at most once)
    pub(crate) fn deliver(&mut self, outcome: Outcome) {
        if let Some(receiver) = self.receiver.take() {
            receiver(outcome);
        }
    }

    fn enter_before(&mut self, index: usize) -> Action {
        if index < self.before.len() {
            self.state = State::Before(index);
            Action::RunHook(Phase::Before, index)
        } else {
            self.state = State::Target;
            Action::RunTarget
        }
    }

    fn enter_after(&mut self, index: usize) -> Action {
        if index < self.after.len() {
            self.state = State::After(index);
            Action::RunHook(Phase::After, index)
        } else {
            let values = std::mem::take(&mut self.values);
            self.finish(Outcome::ok(values))
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Action {
        self.state = State::Finished;
        Action::Deliver(outcome)
    }
}
