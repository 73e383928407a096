//! Chain execution engine
//!
//! Every call of an installed operation builds one chain:
//!
//! | State | Waits for | On success | On error |
//! |-------|-----------|------------|----------|
//! | `Before(i)` | hook `i`'s [`Next`] | `Before(i+1)` or `Target` | deliver error |
//! | `Target` | the operation's [`Done`] | `After(0)` | deliver error, skip after-hooks |
//! | `After(j)` | hook `j`'s [`Next`] | `After(j+1)` or deliver values | deliver error |
//!
//! Before-hooks and after-hooks receive the current values; a continuation
//! called with values replaces them, one called without values passes them on
//! unchanged. The caller's receiver is invoked exactly once per chain unless a
//! hook never calls its continuation.

mod driver;
mod machine;
mod next;

pub use next::{Done, Next};

pub(crate) use driver::run;
pub(crate) use machine::Chain;
