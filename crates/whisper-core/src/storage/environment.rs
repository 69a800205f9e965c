use std::collections::HashMap;

use crate::evaluator::{errors::EvalError, Value};

/// Slot that receives the value returned by the most recent `call`.
pub const LAST_RESULT: &str = "__last_result__";

/// Variable bound to the failure message inside a `handle:` block.
pub const ERROR_VARIABLE: &str = "error";

/// Variable bindings visible to a block of statements.
///
/// There is no block-local scoping: every statement executed against the same
/// environment sees every binding. A called function gets a [`copy`] of its
/// caller's environment.
///
/// [`copy`]: Environment::copy
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding, failing with a name error when it is absent
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::undefined(name))
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Remove a binding; a no-op when it is absent
    pub fn delete(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Shallow copy for a function call: scalars are duplicated while lists
    /// and records keep pointing at the same storage.
    pub fn copy(&self) -> Environment {
        self.clone()
    }

    /// Bound names ordered longest first, so a name is never matched as the
    /// prefix of a longer one. Ties are broken alphabetically to keep the
    /// order deterministic.
    pub fn names_longest_first(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn clear(&mut self) {
        self.variables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_name_error() {
        let env = Environment::new();
        assert_eq!(
            env.get("ghost").unwrap_err().to_string(),
            "Variable 'ghost' is not defined"
        );
    }

    #[test]
    fn test_copy_isolates_scalars_and_shares_lists() {
        let mut env = Environment::new();
        env.set("count", Value::Integer(1));
        env.set("items", Value::list(vec![Value::Integer(1)]));

        let mut callee = env.copy();
        callee.set("count", Value::Integer(99));
        if let Some(Value::List(items)) = callee.lookup("items") {
            items.write().push(Value::Integer(2));
        }

        assert_eq!(env.get("count").unwrap(), Value::Integer(1));
        assert_eq!(env.get("items").unwrap().to_string(), "[1, 2]");
    }

    #[test]
    fn test_names_longest_first() {
        let mut env = Environment::new();
        env.set("a", Value::Null);
        env.set("abc", Value::Null);
        env.set("ab", Value::Null);
        assert_eq!(env.names_longest_first(), vec!["abc", "ab", "a"]);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut env = Environment::new();
        assert!(env.delete("nothing").is_none());
    }
}
