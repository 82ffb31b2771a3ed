//! Command-line interface module.

mod args;
pub mod common;
pub mod exec;
pub mod render;
pub mod watch;

pub use args::{Cli, Commands, OutputArgs};
