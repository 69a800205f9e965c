//! Runtime values of the Whisper dialect.
//!
//! Lists and records are reference types: cloning a [`Value`] that holds one
//! shares the underlying storage, which is what lets a story object stay the
//! same logical record in the environment, in the object store and inside a
//! called function's copied environment.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::errors::{EvalError, EvalResult};

/// Shared, mutable list storage
pub type ListRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable record storage; iteration follows insertion order
pub type RecordRef = Arc<RwLock<IndexMap<String, Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(ListRef),
    Record(RecordRef),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn record(properties: IndexMap<String, Value>) -> Self {
        Value::Record(Arc::new(RwLock::new(properties)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.read().is_empty(),
            Value::Record(props) => !props.read().is_empty(),
        }
    }

    /// Numeric view of the value; booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view of the value. Floats qualify only when they are whole.
    pub fn as_integral(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Copy with fresh list/record storage all the way down.
    ///
    /// Used where a value is spliced into an expression as a literal, which
    /// must not alias the variable it came from. A list or record that
    /// contains itself has no finite copy and is a value error.
    pub fn detached(&self) -> EvalResult<Value> {
        self.detach_within(&mut Vec::new())
    }

    fn detach_within(&self, seen: &mut Vec<usize>) -> EvalResult<Value> {
        match self {
            Value::List(items) => {
                enter(seen, Arc::as_ptr(items) as usize)?;
                let copied = items
                    .read()
                    .iter()
                    .map(|item| item.detach_within(seen))
                    .collect::<EvalResult<Vec<_>>>();
                seen.pop();
                Ok(Value::list(copied?))
            }
            Value::Record(props) => {
                enter(seen, Arc::as_ptr(props) as usize)?;
                let copied = props
                    .read()
                    .iter()
                    .map(|(k, v)| v.detach_within(seen).map(|v| (k.clone(), v)))
                    .collect::<EvalResult<IndexMap<_, _>>>();
                seen.pop();
                Ok(Value::record(copied?))
            }
            other => Ok(other.clone()),
        }
    }

    /// Quoted, escaped representation (the form used inside list and record
    /// displays).
    pub fn repr(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        self.render(&mut out, true, &mut seen);
        out
    }

    fn render(&self, out: &mut String, quoted: bool, seen: &mut Vec<usize>) {
        match self {
            Value::Null => out.push_str("None"),
            Value::Boolean(true) => out.push_str("True"),
            Value::Boolean(false) => out.push_str("False"),
            Value::Integer(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::String(s) if quoted => out.push_str(&quote_str(s)),
            Value::String(s) => out.push_str(s),
            Value::List(items) => {
                let id = Arc::as_ptr(items) as usize;
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(id);
                out.push('[');
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out, true, seen);
                }
                out.push(']');
                seen.pop();
            }
            Value::Record(props) => {
                let id = Arc::as_ptr(props) as usize;
                if seen.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(id);
                out.push('{');
                for (i, (key, value)) in props.read().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote_str(key));
                    out.push_str(": ");
                    value.render(out, true, seen);
                }
                out.push('}');
                seen.pop();
            }
        }
    }
}

fn enter(seen: &mut Vec<usize>, id: usize) -> EvalResult<()> {
    if seen.contains(&id) {
        return Err(EvalError::bad_value(
            "a list or record that contains itself cannot be used here",
        ));
    }
    seen.push(id);
    Ok(())
}

/// Structural equality with numeric coercion across integer, float and
/// boolean. Values of unrelated kinds are simply unequal. A pair of
/// containers met again while comparing them counts as equal, so
/// self-referencing lists compare without recursing forever.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equal_within(other, &mut Vec::new())
    }
}

impl Value {
    fn equal_within(&self, other: &Value, seen: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::List(l), Value::List(r)) => {
                let pair = (Arc::as_ptr(l) as usize, Arc::as_ptr(r) as usize);
                if Arc::ptr_eq(l, r) || seen.contains(&pair) {
                    return true;
                }
                let (l, r) = (l.read().clone(), r.read().clone());
                seen.push(pair);
                let equal = l.len() == r.len()
                    && l.iter().zip(r.iter()).all(|(a, b)| a.equal_within(b, seen));
                seen.pop();
                equal
            }
            (Value::Record(l), Value::Record(r)) => {
                let pair = (Arc::as_ptr(l) as usize, Arc::as_ptr(r) as usize);
                if Arc::ptr_eq(l, r) || seen.contains(&pair) {
                    return true;
                }
                let (l, r) = (l.read().clone(), r.read().clone());
                seen.push(pair);
                let equal = l.len() == r.len()
                    && l.iter()
                        .all(|(k, v)| r.get(k).is_some_and(|o| v.equal_within(o, seen)));
                seen.pop();
                equal
            }
            (l, r) => match (l.as_f64(), r.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let mut seen = Vec::new();
        self.render(&mut out, false, &mut seen);
        f.write_str(&out)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Format a float the way the dialect prints numbers: whole values keep a
/// trailing `.0`, very large or very small magnitudes use exponent form.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let formatted = format!("{f:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => formatted,
        };
    }
    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Quote a string for display inside a collection.
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
