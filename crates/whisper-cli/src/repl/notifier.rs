//! REPL message sinks.
//!
//! Messages produced by the REPL itself (command results, load failures)
//! go through a [`ReplNotifier`]. Program output never does: it is written
//! by the runtime's console.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receives REPL messages
pub trait ReplNotifier: Send + Sync {
    fn on_output(&self, content: &str);

    fn on_error(&self, content: &str);
}

/// Writes messages to stdout and errors to stderr
#[derive(Debug, Default)]
pub struct DefaultNotifier;

impl DefaultNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl ReplNotifier for DefaultNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{content}");
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{content}");
    }
}

/// Keeps every message in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct BufferedNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl ReplNotifier for BufferedNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            self.messages.lock().push(content.to_string());
        }
    }

    fn on_error(&self, content: &str) {
        self.errors.lock().push(content.to_string());
    }
}
