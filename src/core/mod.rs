//! Core types shared by the chains and the host
//!
//! - `Outcome` - Error-or-values result threaded to the terminal receiver
//! - `HookError` - Configuration error types

pub mod error;
pub mod outcome;

pub use error::{HookError, HookResult};
pub use outcome::Outcome;
