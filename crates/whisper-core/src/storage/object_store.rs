use indexmap::IndexMap;

use crate::evaluator::value::{RecordRef, Value};

/// Named story objects created by `there is a ...` statements.
///
/// Entries are shared handles: the record stored here is the same record the
/// environment holds under the object's name, so mutating either one is
/// visible through both.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    objects: IndexMap<String, RecordRef>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a story object
    pub fn declare(&mut self, name: impl Into<String>, record: RecordRef) {
        self.objects.insert(name.into(), record);
    }

    pub fn lookup(&self, name: &str) -> Option<RecordRef> {
        self.objects.get(name).cloned()
    }

    /// Current value of `name.property`, if both exist
    pub fn property(&self, name: &str, property: &str) -> Option<Value> {
        self.objects
            .get(name)
            .and_then(|record| record.read().get(property).cloned())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
