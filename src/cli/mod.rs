//! CLI module - argument parsing and configuration resolution

mod args;

pub use args::Cli;
