//! Multi-line input collection for the REPL
//!
//! A line that opens a block (a header ending in `:`) or asks a question
//! (ending in `?`) starts collection; indented body lines are gathered until
//! a blank line submits the whole block.

/// Result of processing a line of input
#[derive(Debug, PartialEq, Eq)]
pub enum LineProcessResult {
    /// Input is complete and ready for execution
    Complete(String),
    /// More input is needed to complete the statement
    NeedMore,
}

/// Collects multi-line input for complete statements
#[derive(Debug, Default)]
pub struct MultiLineCollector {
    /// Buffer for collecting lines
    buffer: String,
}

impl MultiLineCollector {
    /// Create a new multi-line collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the appropriate prompt for the current state
    pub fn get_prompt(&self) -> &'static str {
        if self.is_collecting() {
            "... " // Continuation prompt
        } else {
            ">> " // Main prompt
        }
    }

    /// Check if we're currently collecting a multi-line statement
    pub fn is_collecting(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Reset the collector state
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Process a line of input
    pub fn process_line(&mut self, line: &str) -> LineProcessResult {
        if !self.is_collecting() {
            if opens_block(line) {
                self.buffer.push_str(line);
                return LineProcessResult::NeedMore;
            }
            return LineProcessResult::Complete(line.to_string());
        }

        if line.trim().is_empty() {
            let complete_code = std::mem::take(&mut self.buffer);
            return LineProcessResult::Complete(complete_code);
        }

        self.buffer.push('\n');
        self.buffer.push_str(line);
        LineProcessResult::NeedMore
    }
}

fn opens_block(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed.ends_with(':') || trimmed.ends_with('?')
}
