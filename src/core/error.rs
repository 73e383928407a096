//! Hook chain error types

use thiserror::Error;

use crate::hooks::Phase;

/// Configuration errors raised by the hook machinery
///
/// Flow errors (a hook or target reporting failure) never appear here: they are
/// carried to the terminal receiver inside an [`Outcome`](super::Outcome).
#[derive(Error, Debug)]
pub enum HookError {
    /// A hook declared no parameter for its continuation
    #[error("Hook #{index} in the {phase} chain of '{method}' must accept a continuation")]
    MissingContinuation {
        /// Method the chain wraps
        method: String,
        /// Chain the hook belongs to
        phase: Phase,
        /// Position of the hook in its chain
        index: usize,
    },

    /// No operation is defined under this name
    #[error("Not callable: no operation named '{0}'")]
    NotCallable(String),

    /// The operation was captured by an installed wrapper and cannot be redefined
    #[error("Operation already installed: {0}")]
    AlreadyInstalled(String),

    /// Method name pattern failed to compile
    #[error("Invalid method pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Every continuation of a chain was dropped before delivery
    #[error("Chain stalled: '{0}' never delivered a result")]
    Stalled(String),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result type alias for hook operations
pub type HookResult<T> = Result<T, HookError>;
