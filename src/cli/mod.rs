//! Command-line interface for social-support.
//!
//! Provides a chat REPL that plays the bot host, one-shot commands, and a
//! configuration check.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, StoreBackend};
