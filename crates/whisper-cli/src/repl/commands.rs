//! REPL command parsing and definitions
//!
//! Handles parsing of dot-commands (.help, .quit, etc.).

use anyhow::{anyhow, Result};

/// Available REPL commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show help information
    Help,
    /// Exit the REPL
    Quit,
    /// Clear the screen
    Clear,
    /// List global variables
    Vars,
    /// Forget all variables, functions and story objects
    Reset,
    /// Run a program file in the current session
    Load(String),
}

/// Parse a command string into a ReplCommand
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('.') else {
        return Err(anyhow!("Commands must start with '.'"));
    };

    let (name, argument) = match body.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (body, ""),
    };

    match name {
        "" => Err(anyhow!("Empty command")),
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        "clear" | "cls" => Ok(ReplCommand::Clear),
        "vars" | "variables" => Ok(ReplCommand::Vars),
        "reset" => Ok(ReplCommand::Reset),
        "load" => {
            if argument.is_empty() {
                return Err(anyhow!("Usage: .load <file>"));
            }
            Ok(ReplCommand::Load(argument.to_string()))
        }
        _ => Err(anyhow!("Unknown command: .{}", name)),
    }
}
