//! Chain driver
//!
//! Runs a [`Chain`] until it either delivers or has to wait for a continuation
//! that was not called synchronously. Continuations called while their hook is
//! still on the stack are queued in a mailbox and picked up by the same loop,
//! so long synchronous chains never grow the call stack.

use std::sync::{Arc, Mutex};

use super::machine::{Action, Chain, Event};
use super::next::{Done, Next, Resumer};
use crate::core::{HookError, HookResult};

enum Slot<H> {
    /// The hook or target is still running on the driver's stack
    Running,
    /// Continuation was called before the driver settled
    Pending(Event),
    /// The driver returned; the chain waits here for its continuation
    Parked(Chain<H>),
    /// Continuation consumed
    Taken,
}

/// Rendezvous between one running step and its continuation
pub(crate) struct Mailbox<H> {
    slot: Mutex<Slot<H>>,
}

impl<H> Mailbox<H> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Running),
        })
    }

    /// Called by the driver once the step returned
    ///
    /// Returns the queued event if the continuation already fired, otherwise
    /// parks the chain and returns `None`.
    fn settle(&self, chain: Chain<H>) -> Option<(Chain<H>, Event)> {
        let mut slot = self.slot.lock().unwrap();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Pending(event) => Some((chain, event)),
            Slot::Running => {
                *slot = Slot::Parked(chain);
                None
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Called by a continuation
    ///
    /// Queues the event if the driver has not settled yet, otherwise hands back
    /// the parked chain so the caller can drive it.
    pub(crate) fn signal(&self, event: Event) -> Option<(Chain<H>, Event)> {
        let mut slot = self.slot.lock().unwrap();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Running => {
                *slot = Slot::Pending(event);
                None
            }
            Slot::Parked(chain) => Some((chain, event)),
            other => {
                *slot = other;
                None
            }
        }
    }
}

/// Start a fresh chain on the caller's stack
pub(crate) fn run<H: Send + Sync + 'static>(mut chain: Chain<H>) -> HookResult<()> {
    tracing::debug!(chain = %chain.id, method = %chain.method, "[Chain] Started");
    let action = chain.start();
    drive(chain, action)
}

/// Resume a parked chain with the event its continuation produced
pub(crate) fn resume<H: Send + Sync + 'static>(mut chain: Chain<H>, event: Event) -> HookResult<()> {
    let action = chain.step(event);
    drive(chain, action)
}

fn drive<H: Send + Sync + 'static>(mut chain: Chain<H>, mut action: Action) -> HookResult<()> {
    loop {
        let mailbox = match action {
            Action::Deliver(outcome) => {
                tracing::debug!(
                    chain = %chain.id,
                    method = %chain.method,
                    is_error = outcome.is_err(),
                    "[Chain] Delivering to receiver"
                );
                chain.deliver(outcome);
                return Ok(());
            }
            Action::Ignore => return Ok(()),
            Action::RunHook(phase, index) => {
                let hook = match chain.hook(phase, index) {
                    Some(hook) => hook.clone(),
                    None => return Ok(()),
                };
                if hook.params() == 0 {
                    return Err(HookError::MissingContinuation {
                        method: chain.method.clone(),
                        phase,
                        index,
                    });
                }

                let mailbox = Mailbox::new();
                let host = Arc::clone(&chain.host);
                let next = Next::new(Resumer::new(Arc::clone(&mailbox)), Arc::clone(&host));
                hook.invoke(&host, chain.values.clone(), next)?;
                mailbox
            }
            Action::RunTarget => {
                let mailbox = Mailbox::new();
                let host = Arc::clone(&chain.host);
                let target = chain.target.clone();
                let args = std::mem::take(&mut chain.values);
                let done = Done::resuming(Resumer::new(Arc::clone(&mailbox)));
                target.invoke(&host, args, done)?;
                mailbox
            }
        };

        match mailbox.settle(chain) {
            Some((resumed, event)) => {
                chain = resumed;
                action = chain.step(event);
            }
            None => return Ok(()),
        }
    }
}
