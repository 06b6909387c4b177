//! Command-line interface for pinacquire.

mod commands;
pub mod helpers;
pub mod progress;

pub use commands::{is_debug, is_verbose, run};
