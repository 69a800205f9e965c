//! Whisper CLI - Command-line runner and interactive REPL for the Whisper
//! language
//!
//! This crate provides argument handling for the `whisper` binary and REPL
//! functionality: dot-command parsing, indented block collection and output
//! notification.

pub mod cli;
pub mod repl;

// Re-export commonly used types for convenience
pub use cli::{build_cli, config_from_matches};
pub use repl::{DefaultNotifier, Repl, ReplCommand, ReplNotifier};
