//! Command handlers.
//!
//! Handlers are thin: they parse or validate CLI input, call the
//! [`gamesrv_core::ServerControl`] port, and format replies through
//! [`crate::presentation`].

pub mod check_config;
pub mod console;
pub mod dispatch;

pub use dispatch::{Flow, dispatch};
