//! REPL (Read-Eval-Print Loop) functionality for Whisper
//!
//! This module provides interactive command-line interface components that wrap
//! the core Whisper runtime with user-friendly features like:
//! - Command history and editing
//! - Collection of indented blocks
//! - REPL commands (.help, .quit, etc.)
//! - Message notifications

use std::time::Instant;

use anyhow::Result;
use whisper_core::{WhisperError, WhisperRuntime};

pub mod commands;
pub mod multiline;
pub mod notifier;

pub use commands::ReplCommand;
pub use multiline::{LineProcessResult, MultiLineCollector};
pub use notifier::{BufferedNotifier, DefaultNotifier, ReplNotifier};

/// Interactive REPL for the Whisper language
pub struct Repl {
    /// Core Whisper runtime; variables survive between inputs
    runtime: WhisperRuntime,
    /// Current notifier for REPL messages
    notifier: Box<dyn ReplNotifier>,
    /// Whether the REPL is running
    running: bool,
}

impl Repl {
    /// Create a new REPL with the given runtime
    pub fn new(runtime: WhisperRuntime) -> Self {
        Self {
            runtime,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
        }
    }

    /// Set the notifier for this REPL
    pub fn set_notifier(&mut self, notifier: Box<dyn ReplNotifier>) {
        self.notifier = notifier;
    }

    /// Get a reference to the current notifier
    pub fn notifier(&self) -> &dyn ReplNotifier {
        self.notifier.as_ref()
    }

    pub fn runtime(&self) -> &WhisperRuntime {
        &self.runtime
    }

    /// Check if the REPL is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Parse REPL input into a command
    pub fn parse_input(&self, input: &str) -> Result<ReplCommand> {
        commands::parse_command(input)
    }

    /// Handle a REPL command
    pub fn handle_command(&mut self, command: ReplCommand) -> Result<String> {
        match command {
            ReplCommand::Help => Ok(help_text().to_string()),
            ReplCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            ReplCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                Ok(String::new())
            }
            ReplCommand::Vars => Ok(self.format_variables()),
            ReplCommand::Reset => {
                self.runtime.reset();
                Ok("All variables, functions and story objects forgotten.".to_string())
            }
            ReplCommand::Load(path) => self.load(&path),
        }
    }

    /// Run Whisper source in the current session and return the elapsed
    /// milliseconds
    pub fn execute(&mut self, code: &str) -> Result<u64> {
        let start = Instant::now();
        self.runtime.run_source(code)?;
        Ok(start.elapsed().as_millis() as u64)
    }

    fn load(&mut self, path: &str) -> Result<String> {
        match self.runtime.run_file(path) {
            Ok(()) => Ok(format!("Loaded '{path}'")),
            // Already reported on the console
            Err(WhisperError::SourceNotFound(_)) => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn format_variables(&self) -> String {
        let variables = self.runtime.variables();
        if variables.is_empty() {
            return "No variables defined.".to_string();
        }
        let mut lines: Vec<String> = variables
            .iter()
            .map(|(name, value)| format!("  {name} = {}", value.repr()))
            .collect();
        let objects = self.runtime.object_names();
        if !objects.is_empty() {
            lines.push(format!("Story objects: {}", objects.join(", ")));
        }
        lines.join("\n")
    }
}

fn help_text() -> &'static str {
    r#"Whisper REPL Commands:
  .help         - Show this help message
  .quit         - Exit the REPL
  .clear        - Clear the screen
  .vars         - List variables and story objects
  .reset        - Forget all variables, functions and story objects
  .load <file>  - Run a program file in this session

A line ending in ':' or '?' starts a block; finish it with an empty line.

Whisper Sentences:
  - Variables: let x be 5 / remember that name is "Ada" / set x to 2
  - Output: show x / tell me "Hi " name / announce "no newline"
  - Conditions: when x is 5: ... or when ...: ... otherwise: ...
  - Questions: is x greater than 3? then yes: / no: blocks
  - Loops: while x is less than 10: / repeat 3: / for each item in items:
  - Functions: define greet with name: ... give back ... / call greet with "Ada"
  - Stories: there is a hero with health 100 / the hero loses 20 health
  - Errors: attempt: ... handle: show error"#
}
