use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    sync::Arc,
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use tracing::debug;

use crate::evaluator::{EvalError, EvalResult};

/// Text output and line input for a running program
pub trait Console: Send {
    /// Write text as-is; callers add their own line breaks
    fn print(&mut self, text: &str) -> EvalResult<()>;

    /// Show `prompt` and read one line of input without its line break
    fn read_line(&mut self, prompt: &str) -> EvalResult<String>;
}

fn end_of_input() -> EvalError {
    EvalError::Io("EOF when reading a line".to_string())
}

/// Process stdout and stdin.
///
/// With a timeout, input is read by a background thread so that
/// `read_line` can give up instead of blocking forever. Without one, stdin
/// is read directly and nothing else holds it between reads.
pub struct StdConsole {
    timeout: Option<Duration>,
    input: Option<Receiver<io::Result<String>>>,
}

impl StdConsole {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            input: None,
        }
    }

    fn input(&mut self) -> &Receiver<io::Result<String>> {
        self.input.get_or_insert_with(|| {
            let (tx, rx) = crossbeam_channel::unbounded();
            thread::spawn(move || {
                let stdin = io::stdin();
                loop {
                    let mut line = String::new();
                    match stdin.lock().read_line(&mut line) {
                        Ok(0) => break,
                        Ok(_) => {
                            if tx.send(Ok(line)).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            let _ = tx.send(Err(err));
                            break;
                        }
                    }
                }
                debug!("stdin reader finished");
            });
            rx
        })
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Console for StdConsole {
    fn print(&mut self, text: &str) -> EvalResult<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> EvalResult<String> {
        self.print(prompt)?;
        let line = match self.timeout {
            Some(limit) => self
                .input()
                .recv_timeout(limit)
                .map_err(|err| match err {
                    RecvTimeoutError::Timeout => EvalError::Io(format!(
                        "timed out waiting for input after {} ms",
                        limit.as_millis()
                    )),
                    RecvTimeoutError::Disconnected => end_of_input(),
                })??,
            None => {
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Err(end_of_input());
                }
                line
            }
        };
        Ok(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string())
    }
}

/// In-memory console.
///
/// Clones share the same output buffer and input queue, so a test can keep
/// one handle while the interpreter owns another.
#[derive(Clone, Default)]
pub struct CapturedConsole {
    output: Arc<Mutex<String>>,
    input: Arc<Mutex<VecDeque<String>>>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console whose `read_line` answers with `lines` in order
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::new();
        console
            .input
            .lock()
            .extend(lines.into_iter().map(Into::into));
        console
    }

    pub fn push_input(&self, line: impl Into<String>) {
        self.input.lock().push_back(line.into());
    }

    /// Everything printed so far
    pub fn output(&self) -> String {
        self.output.lock().clone()
    }

    /// Printed output split into lines
    pub fn lines(&self) -> Vec<String> {
        self.output.lock().lines().map(str::to_string).collect()
    }

    /// Return and clear the printed output
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.lock())
    }
}

impl Console for CapturedConsole {
    fn print(&mut self, text: &str) -> EvalResult<()> {
        self.output.lock().push_str(text);
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> EvalResult<String> {
        self.print(prompt)?;
        self.input.lock().pop_front().ok_or_else(end_of_input)
    }
}
