//! Shared helpers: logging setup and the terminal cleanup guard.

pub mod context;
pub mod logger;
