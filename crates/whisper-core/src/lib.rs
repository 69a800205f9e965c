//! # Whisper Core
//!
//! Core implementation of the Whisper scripting language, a dialect of
//! plain English sentences structured by indentation:
//! - Statement tree definitions
//! - Line preprocessing and block segmentation
//! - Expression evaluator with identifier and property resolution
//! - Statement executor with explicit control-flow outcomes
//! - Run-scoped storage for variables, functions and story objects
//!
//! This crate provides the foundational components that can be used to build
//! various Whisper interfaces (command line, REPL, embedded runtime, etc.)

#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

pub mod ast;
pub mod evaluator;
pub mod executor;
pub mod host;
pub mod parser;
pub mod storage;

pub mod runtime;

// Re-export commonly used types
pub use ast::{Block, Statement, StatementKind};
pub use evaluator::{ErrorKind, EvalError, EvalResult, Evaluator, Value};
pub use executor::{ControlFlow, Interpreter};
pub use host::{CapturedConsole, Console, FileStore, LocalFiles, MemoryFiles, StdConsole};
pub use parser::parse_program;
pub use runtime::WhisperRuntime;
pub use storage::{Environment, FunctionTable, ObjectStore};

/// Whisper language version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Whisper language features supported by this build
pub fn features() -> Vec<&'static str> {
    vec!["core", "story-objects", "functions", "file-io"]
}

/// Initialize tracing for Whisper core components.
///
/// Logs go to stderr so they never mix with program output. `RUST_LOG`
/// overrides the default `whisper_core=warn` directive.
pub fn init_tracing() {
    init_tracing_with("whisper_core=warn");
}

/// Initialize tracing with an explicit default directive such as
/// `whisper_core=debug`
pub fn init_tracing_with(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Core Whisper runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Safety cap on the body executions of a single `while` loop
    pub max_loop_iterations: usize,
    /// Deepest allowed nesting of user function calls
    pub max_call_depth: usize,
    /// Give up waiting for `ask` input after this many milliseconds
    pub input_timeout_ms: Option<u64>,
    /// Seed for `random()` and `randint()`
    pub random_seed: Option<u64>,
    /// Enable debug mode
    pub debug: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            max_loop_iterations: 10_000,
            max_call_depth: 200,
            input_timeout_ms: None,
            random_seed: None,
            debug: false,
        }
    }
}

impl WhisperConfig {
    /// Load a configuration from JSON text; absent keys keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| WhisperError::Config(err.to_string()))
    }
}

/// Error types for Whisper core operations
#[derive(thiserror::Error, Debug)]
pub enum WhisperError {
    /// Evaluation or execution error
    #[error("{0}")]
    Eval(#[from] EvalError),

    /// Source file does not exist
    #[error("File '{0}' not found")]
    SourceNotFound(String),

    /// Source loading error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Whisper core operations
pub type Result<T> = std::result::Result<T, WhisperError>;
