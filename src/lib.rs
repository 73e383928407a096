//! Before/after hook chains around callback-style operations.
//!
//! Define operations on a [`Hookable`] host, then register hooks that run
//! before them (to veto or rewrite arguments) and after them (to rewrite the
//! result). See [`hooks`] for an overview.

pub mod chain;
pub mod core;
pub mod hooks;
pub mod host;

// Optional components
pub mod logging;

pub use crate::chain::{Done, Next};
pub use crate::core::{HookError, HookResult, Outcome};
pub use crate::hooks::{AsyncHook, Flow, HookFn, HookTable, MethodMatcher, Operation, Phase};
pub use crate::host::{HookConfig, Hookable};
