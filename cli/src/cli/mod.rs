//! CLI module.

pub mod args;
pub mod commands;

pub use args::{ApiArgs, Cli, Commands, CreateTokenArgs, ShellType};
