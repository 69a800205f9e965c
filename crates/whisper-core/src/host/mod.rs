//! The interpreter's view of the outside world: a console for display and
//! `ask` statements, and a file store for `write`/`read` statements.

mod console;
mod files;

pub use console::{CapturedConsole, Console, StdConsole};
pub use files::{FileStore, LocalFiles, MemoryFiles};
