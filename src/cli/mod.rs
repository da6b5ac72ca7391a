//! CLI module - argument parsing and subcommand runners

pub mod args;
pub mod evaluate;
pub mod prepare;

pub use args::{Cli, Commands, EvaluateArgs, PrepareArgs};
pub use evaluate::run_evaluate;
pub use prepare::{read_recipe, run_prepare};
