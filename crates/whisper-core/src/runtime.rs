//! Whisper Runtime - High-level interface for Whisper program execution
//!
//! Provides a simplified interface that wraps the block parser and the
//! interpreter for use by external components like the CLI and the REPL.

use std::{fs, io, path::Path};

use tracing::{debug, info};

use crate::{
    evaluator::Value,
    executor::Interpreter,
    host::{Console, FileStore},
    parser::parse_program,
    Result, WhisperConfig, WhisperError,
};

/// High-level Whisper runtime. State persists across `run_*` calls until
/// [`reset`](WhisperRuntime::reset).
pub struct WhisperRuntime {
    interpreter: Interpreter,
}

impl WhisperRuntime {
    /// Create a runtime using stdin/stdout and the local filesystem
    pub fn new(config: WhisperConfig) -> Self {
        Self {
            interpreter: Interpreter::new(config),
        }
    }

    /// Create a runtime with custom console and file collaborators
    pub fn with_host(
        config: WhisperConfig,
        console: Box<dyn Console>,
        files: Box<dyn FileStore>,
    ) -> Self {
        Self {
            interpreter: Interpreter::with_host(config, console, files),
        }
    }

    /// Parse and run Whisper source text
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        let program = parse_program(source);
        debug!(statements = program.len(), "parsed program");
        self.interpreter.run(&program)?;
        Ok(())
    }

    /// Load and run a source file. A missing file is reported on the
    /// console as well as returned.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let shown = path.display().to_string();
                self.interpreter
                    .print(&format!("Error: File '{shown}' not found\n"))?;
                return Err(WhisperError::SourceNotFound(shown));
            }
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), "running file");
        self.run_source(&source)
    }

    /// Current value of a global variable
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.interpreter.globals().lookup(name).cloned()
    }

    /// All global variables sorted by name
    pub fn variables(&self) -> Vec<(String, Value)> {
        let mut variables: Vec<(String, Value)> = self
            .interpreter
            .globals()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        variables.sort_by(|a, b| a.0.cmp(&b.0));
        variables
    }

    /// Names of the defined functions, sorted
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .interpreter
            .functions()
            .names()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Names of the story objects, in creation order
    pub fn object_names(&self) -> Vec<String> {
        self.interpreter
            .objects()
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Drop all variables, functions and story objects
    pub fn reset(&mut self) {
        self.interpreter.reset();
    }

    pub fn config(&self) -> &WhisperConfig {
        self.interpreter.config()
    }

    /// Get a mutable reference to the interpreter
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}
