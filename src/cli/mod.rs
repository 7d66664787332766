//! Command-line interface module.

mod args;
pub mod common;
pub mod convert;
pub mod publish;
pub mod serve;

pub use args::{Cli, Commands};
