use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::evaluator::{EvalError, EvalResult};

/// Whole-file UTF-8 text storage used by `write` and `read`
pub trait FileStore: Send {
    /// Replace the file's contents with `contents`
    fn write(&mut self, path: &str, contents: &str) -> EvalResult<()>;

    fn read(&mut self, path: &str) -> EvalResult<String>;
}

/// Files on the local filesystem, optionally resolved against a base
/// directory
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    root: Option<PathBuf>,
}

impl LocalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => Path::new(path).to_path_buf(),
        }
    }
}

impl FileStore for LocalFiles {
    fn write(&mut self, path: &str, contents: &str) -> EvalResult<()> {
        fs::write(self.resolve(path), contents)
            .map_err(|err| EvalError::Io(format!("cannot write '{path}': {err}")))
    }

    fn read(&mut self, path: &str) -> EvalResult<String> {
        fs::read_to_string(self.resolve(path))
            .map_err(|err| EvalError::Io(format!("cannot read '{path}': {err}")))
    }
}

/// In-memory files. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }
}

impl FileStore for MemoryFiles {
    fn write(&mut self, path: &str, contents: &str) -> EvalResult<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn read(&mut self, path: &str) -> EvalResult<String> {
        self.get(path).ok_or_else(|| {
            EvalError::Io(format!("cannot read '{path}': No such file or directory"))
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_local_files_round_trip_under_root() {
        let dir = TempDir::new().unwrap();
        let mut files = LocalFiles::rooted(dir.path());
        files.write("notes.txt", "first").unwrap();
        files.write("notes.txt", "second").unwrap();
        assert_eq!(files.read("notes.txt").unwrap(), "second");
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut files = LocalFiles::rooted(dir.path());
        let err = files.read("absent.txt").unwrap_err();
        assert_eq!(err.kind(), crate::evaluator::ErrorKind::Io);
    }

    #[test]
    fn test_memory_files_share_storage() {
        let files = MemoryFiles::new();
        let mut handle = files.clone();
        handle.write("a.txt", "hi").unwrap();
        assert_eq!(files.get("a.txt").as_deref(), Some("hi"));
        assert!(handle.read("b.txt").is_err());
    }
}
