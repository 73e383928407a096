//! Hook Types
//!
//! Core types for the hooks system:
//! - `Phase` - Which chain a hook belongs to
//! - `HookFn` - A registered hook
//! - `Flow` - Declarative continuation decision
//! - `AsyncHook` - Trait for hooks that await before deciding
//! - `Operation` - The target operation a chain wraps

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::{Done, Next};
use crate::core::HookResult;

/// Hook chain phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Runs before the target - can veto it or rewrite its arguments
    Before,
    /// Runs after the target completes - can rewrite its result
    After,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

/// What a hook decided, in declarative form
///
/// Mirrors the three ways of calling a continuation.
#[derive(Debug)]
pub enum Flow {
    /// Continue with the values this hook received
    Pass,
    /// Continue with new values (an empty list behaves like `Pass`)
    Replace(Vec<Value>),
    /// Stop the chain and report the error to the caller
    Abort(anyhow::Error),
}

impl Flow {
    /// Abort with an error
    pub fn abort(err: impl Into<anyhow::Error>) -> Self {
        Flow::Abort(err.into())
    }
}

type HookCallback<H> = dyn Fn(&Arc<H>, Vec<Value>, Next<H>) -> HookResult<()> + Send + Sync;

/// A hook registered on a before or after chain
///
/// A hook receives the host context, the current values and a single-use
/// continuation. Clones share identity, so keep a clone around to remove the
/// hook later.
pub struct HookFn<H> {
    /// Declared parameter count, continuation included
    params: usize,
    callback: Arc<HookCallback<H>>,
}

impl<H> Clone for HookFn<H> {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<H: Send + Sync + 'static> HookFn<H> {
    /// Create a hook that accepts a continuation
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Arc<H>, Vec<Value>, Next<H>) -> HookResult<()> + Send + Sync + 'static,
    {
        Self::with_params(1, callback)
    }

    /// Create a hook with an explicit declared parameter count
    ///
    /// Used for hooks bridged from sources that describe their own signature.
    /// A count of zero means the hook takes no continuation; running it fails
    /// with [`HookError::MissingContinuation`](crate::core::HookError).
    pub fn with_params<F>(params: usize, callback: F) -> Self
    where
        F: Fn(&Arc<H>, Vec<Value>, Next<H>) -> HookResult<()> + Send + Sync + 'static,
    {
        Self {
            params,
            callback: Arc::new(callback),
        }
    }

    /// Create a hook from a function that returns its decision
    pub fn from_flow<F>(decide: F) -> Self
    where
        F: Fn(&Arc<H>, Vec<Value>) -> Flow + Send + Sync + 'static,
    {
        Self::new(move |host, values, next| next.apply(decide(host, values)))
    }

    /// Create a hook from an [`AsyncHook`]
    ///
    /// The hook runs on a spawned tokio task and resumes the chain from there.
    /// Outside a tokio runtime the continuation is dropped and the chain
    /// stalls.
    pub fn from_async<A>(hook: A) -> Self
    where
        A: AsyncHook<H> + 'static,
    {
        let hook = Arc::new(hook);
        Self::new(move |host, values, next| {
            let hook = Arc::clone(&hook);
            let host = Arc::clone(host);
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::error!("[HookFn] Async hook needs a tokio runtime; chain stalled");
                return Ok(());
            };
            runtime.spawn(async move {
                let flow = hook.call(host, values).await;
                if let Err(e) = next.apply(flow) {
                    tracing::error!("[HookFn] Async hook resumed a misconfigured chain: {}", e);
                }
            });
            Ok(())
        })
    }
}

impl<H> HookFn<H> {
    /// Declared parameter count, continuation included
    pub fn params(&self) -> usize {
        self.params
    }

    /// Check whether two handles refer to the same registered hook
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }

    pub(crate) fn invoke(&self, host: &Arc<H>, values: Vec<Value>, next: Next<H>) -> HookResult<()> {
        (self.callback)(host, values, next)
    }
}

impl<H> std::fmt::Debug for HookFn<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookFn")
            .field("params", &self.params)
            .finish()
    }
}

/// Trait for hooks that need to await before deciding
///
/// Adapt with [`HookFn::from_async`].
#[async_trait]
pub trait AsyncHook<H>: Send + Sync
where
    H: Send + Sync + 'static,
{
    /// Inspect the values and decide how the chain continues
    async fn call(&self, host: Arc<H>, values: Vec<Value>) -> Flow;
}

type OperationCallback<H> = dyn Fn(&Arc<H>, Vec<Value>, Done) -> HookResult<()> + Send + Sync;

/// An operation defined on a host
///
/// The operation must call its [`Done`] at most once; `Done` is consumed on use.
pub struct Operation<H> {
    callback: Arc<OperationCallback<H>>,
}

impl<H> Clone for Operation<H> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<H> Operation<H> {
    /// Wrap a function as an operation
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Arc<H>, Vec<Value>, Done) -> HookResult<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, host: &Arc<H>, args: Vec<Value>, done: Done) -> HookResult<()> {
        (self.callback)(host, args, done)
    }
}

impl<H> std::fmt::Debug for Operation<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Before.to_string(), "before");
        assert_eq!(Phase::After.to_string(), "after");
    }

    #[test]
    fn test_phase_serde() {
        let phase: Phase = serde_json::from_str("\"after\"").unwrap();
        assert_eq!(phase, Phase::After);
    }

    #[test]
    fn test_hook_identity() {
        let hook: HookFn<()> = HookFn::new(|_host, _values, next| next.pass());
        let clone = hook.clone();
        let other: HookFn<()> = HookFn::new(|_host, _values, next| next.pass());

        assert!(hook.same(&clone));
        assert!(!hook.same(&other));
    }

    #[test]
    fn test_declared_params() {
        let hook: HookFn<()> = HookFn::new(|_host, _values, next| next.pass());
        assert_eq!(hook.params(), 1);

        let bare: HookFn<()> = HookFn::with_params(0, |_host, _values, _next| Ok(()));
        assert_eq!(bare.params(), 0);
    }
}
