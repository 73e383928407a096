//! Continuations handed to hooks and targets
//!
//! Both are single use: every method consumes `self`.

use std::sync::Arc;

use serde_json::Value;

use super::driver::{self, Mailbox};
use super::machine::Event;
use crate::core::{HookResult, Outcome};
use crate::hooks::Flow;

/// Feeds one event back into the chain that created it
pub(crate) struct Resumer<H> {
    mailbox: Option<Arc<Mailbox<H>>>,
}

impl<H: Send + Sync + 'static> Resumer<H> {
    pub(crate) fn new(mailbox: Arc<Mailbox<H>>) -> Self {
        Self {
            mailbox: Some(mailbox),
        }
    }

    fn fire(mut self, event: Event) -> HookResult<()> {
        let Some(mailbox) = self.mailbox.take() else {
            return Ok(());
        };
        match mailbox.signal(event) {
            Some((chain, event)) => driver::resume(chain, event),
            None => Ok(()),
        }
    }
}

impl<H> Drop for Resumer<H> {
    fn drop(&mut self) {
        if self.mailbox.is_some() {
            tracing::debug!("[Chain] Continuation dropped without being called; chain stalled");
        }
    }
}

/// Continuation passed to every hook
///
/// Call exactly one of [`pass`](Next::pass), [`fail`](Next::fail),
/// [`replace`](Next::replace), [`resume`](Next::resume) or
/// [`apply`](Next::apply). Dropping it without a call stalls the chain.
///
/// The returned `Result` is `Err` only for configuration errors hit while the
/// chain advances on the caller's stack; propagate it.
pub struct Next<H> {
    resumer: Resumer<H>,
    host: Arc<H>,
}

impl<H: Send + Sync + 'static> Next<H> {
    pub(crate) fn new(resumer: Resumer<H>, host: Arc<H>) -> Self {
        Self { resumer, host }
    }

    /// Shared host context of the chain
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Continue with the values this hook received
    pub fn pass(self) -> HookResult<()> {
        self.resume(None, Vec::new())
    }

    /// Abort the chain and report `err` to the caller
    pub fn fail(self, err: impl Into<anyhow::Error>) -> HookResult<()> {
        self.resume(Some(err.into()), Vec::new())
    }

    /// Continue with new values; an empty list behaves like [`pass`](Next::pass)
    pub fn replace(self, values: Vec<Value>) -> HookResult<()> {
        self.resume(None, values)
    }

    /// General form: an error aborts, otherwise non-empty values override
    pub fn resume(self, error: Option<anyhow::Error>, values: Vec<Value>) -> HookResult<()> {
        self.resumer.fire(Event::from_resume(error, values))
    }

    /// Continue according to a [`Flow`]
    pub fn apply(self, flow: Flow) -> HookResult<()> {
        match flow {
            Flow::Pass => self.pass(),
            Flow::Replace(values) => self.replace(values),
            Flow::Abort(err) => self.fail(err),
        }
    }
}

impl<H> std::fmt::Debug for Next<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

type Completion = Box<dyn FnOnce(Outcome) -> HookResult<()> + Send>;

/// Completion handed to an operation
///
/// Must be called at most once; it is consumed on use.
pub struct Done {
    complete: Completion,
}

impl Done {
    /// Completion that calls `complete` directly
    pub(crate) fn new<F>(complete: F) -> Self
    where
        F: FnOnce(Outcome) -> HookResult<()> + Send + 'static,
    {
        Self {
            complete: Box::new(complete),
        }
    }

    /// Completion that resumes a chain into its after-hooks
    pub(crate) fn resuming<H: Send + Sync + 'static>(resumer: Resumer<H>) -> Self {
        Self::new(move |outcome| resumer.fire(Event::Complete(outcome)))
    }

    /// Complete with an outcome as-is
    pub fn complete(self, outcome: Outcome) -> HookResult<()> {
        (self.complete)(outcome)
    }

    /// Complete successfully with `values`
    pub fn ok(self, values: Vec<Value>) -> HookResult<()> {
        self.complete(Outcome::ok(values))
    }

    /// Complete with an error
    pub fn fail(self, err: impl Into<anyhow::Error>) -> HookResult<()> {
        self.complete(Outcome::err(err))
    }
}

impl std::fmt::Debug for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Done").finish_non_exhaustive()
    }
}
