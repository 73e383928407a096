//! Hooks Module
//!
//! Compose "before" and "after" hooks around an operation without touching
//! the operation itself.
//!
//! # Overview
//!
//! Hooks let you:
//! - Veto a call before the operation runs
//! - Rewrite the arguments the operation receives
//! - Rewrite the result the caller eventually receives
//! - Log and audit calls
//!
//! # Example
//!
//! ```ignore
//! use hookchain::{HookFn, Hookable, Operation};
//! use serde_json::json;
//!
//! let mut store = Hookable::new(Store::default());
//! store.define("save", Operation::new(|store, args, done| {
//!     store.write(&args)?;
//!     done.ok(vec![json!("saved")])
//! }))?;
//!
//! // Reject empty documents
//! store.before("save", HookFn::new(|_store, args, next| {
//!     if args.is_empty() {
//!         next.fail(anyhow::anyhow!("nothing to save"))
//!     } else {
//!         next.pass()
//!     }
//! }))?;
//!
//! // Tag the result
//! store.after("save", HookFn::new(|_store, mut values, next| {
//!     values.push(json!("audited"));
//!     next.replace(values)
//! }))?;
//! ```
//!
//! # Continuations
//!
//! | Call | Effect |
//! |------|--------|
//! | `next.pass()` | Continue with the values this hook received |
//! | `next.replace(values)` | Continue with `values` instead |
//! | `next.fail(err)` | Skip everything left and report `err` to the caller |
//! | `next.apply(flow)` | Any of the above, from a [`Flow`] |

mod registry;
mod types;

pub use registry::{HookTable, MethodMatcher};
pub use types::{AsyncHook, Flow, HookFn, Operation, Phase};
