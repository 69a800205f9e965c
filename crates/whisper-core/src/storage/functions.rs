use std::{collections::HashMap, sync::Arc};

use crate::ast::Block;

/// A user-defined function: positional parameter names and a body block
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Arc<Block>,
}

/// Functions registered by `define` during a run. Names are unique; a later
/// definition replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Arc<Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, returning the definition it replaced
    pub fn define(&mut self, function: Function) -> Option<Arc<Function>> {
        self.functions
            .insert(function.name.clone(), Arc::new(function))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}
