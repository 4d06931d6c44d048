//! CLI module - argument parsing and command execution

mod args;
pub mod convert;

pub use args::Cli;
pub use convert::run;
