//! Hookable hosts
//!
//! - `Hookable` - Defines operations, installs chains around them, calls them
//! - `HookConfig` - Host configuration

mod config;
mod hookable;

pub use config::HookConfig;
pub use hookable::Hookable;
