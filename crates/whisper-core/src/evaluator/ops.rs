//! Operator semantics shared by the expression evaluator and by statements
//! that do arithmetic themselves (`increase`, `the hero loses ...`).

use std::{cmp::Ordering, sync::Arc};

use super::{
    errors::{EvalError, EvalResult},
    grammar::{BinaryOp, CompareOp, UnaryOp},
    Value,
};

/// Numeric view of a value; booleans behave as 0/1
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Integer(i) => Some(Num::Int(*i)),
            Value::Boolean(b) => Some(Num::Int(i64::from(*b))),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::FloorDivide => "//",
        BinaryOp::Modulo => "%",
        BinaryOp::Power => "**",
    }
}

/// Generic numeric binary operation helper. Integer results that overflow
/// are recomputed in floating point.
fn numeric_binop<I, F>(
    left: &Value,
    right: &Value,
    op: BinaryOp,
    int_op: I,
    float_op: F,
) -> EvalResult<Value>
where
    I: Fn(i64, i64) -> Option<i64>,
    F: Fn(f64, f64) -> f64,
{
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(l)), Some(Num::Int(r))) => Ok(match int_op(l, r) {
            Some(i) => Value::Integer(i),
            None => Value::Float(float_op(l as f64, r as f64)),
        }),
        (Some(l), Some(r)) => Ok(Value::Float(float_op(l.to_f64(), r.to_f64()))),
        _ => Err(EvalError::binary_type_error(
            op_symbol(op),
            left.type_name(),
            right.type_name(),
        )),
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => subtract(left, right),
        BinaryOp::Multiply => multiply(left, right),
        BinaryOp::Divide => divide(left, right),
        BinaryOp::FloorDivide => floor_divide(left, right),
        BinaryOp::Modulo => modulo(left, right),
        BinaryOp::Power => power(left, right),
    }
}

pub fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),
        (Value::List(l), Value::List(r)) => {
            let mut items = l.read().clone();
            items.extend(r.read().iter().cloned());
            Ok(Value::list(items))
        }
        _ => numeric_binop(left, right, BinaryOp::Add, i64::checked_add, |a, b| a + b),
    }
}

pub fn subtract(left: &Value, right: &Value) -> EvalResult<Value> {
    numeric_binop(left, right, BinaryOp::Subtract, i64::checked_sub, |a, b| a - b)
}

/// Longest string (in bytes) or list a repetition may produce
pub const MAX_REPEATED_LEN: usize = 1 << 24;

pub fn multiply(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::String(s), count) | (count, Value::String(s)) if is_count(count) => {
            let n = repeat_count(count);
            let total = repeated_len(s.len(), n)?;
            Ok(Value::String(if total == 0 {
                String::new()
            } else {
                s.repeat(n)
            }))
        }
        (Value::List(items), count) | (count, Value::List(items)) if is_count(count) => {
            let items = items.read();
            let total = repeated_len(items.len(), repeat_count(count))?;
            Ok(Value::list(items.iter().cycle().take(total).cloned().collect()))
        }
        _ => numeric_binop(left, right, BinaryOp::Multiply, i64::checked_mul, |a, b| a * b),
    }
}

fn repeated_len(len: usize, count: usize) -> EvalResult<usize> {
    len.checked_mul(count)
        .filter(|total| *total <= MAX_REPEATED_LEN)
        .ok_or_else(|| EvalError::bad_value("repeated sequence is too long"))
}

fn is_count(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Boolean(_))
}

fn repeat_count(value: &Value) -> usize {
    match value {
        Value::Integer(i) => usize::try_from(*i).unwrap_or(0),
        Value::Boolean(b) => usize::from(*b),
        _ => 0,
    }
}

fn is_zero(value: &Value) -> bool {
    Num::of(value).is_some_and(|n| n.to_f64() == 0.0)
}

/// True division: always produces a float
pub fn divide(left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(l), Some(r)) = (Num::of(left), Num::of(right)) else {
        return Err(EvalError::binary_type_error(
            "/",
            left.type_name(),
            right.type_name(),
        ));
    };
    if r.to_f64() == 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    Ok(Value::Float(l.to_f64() / r.to_f64()))
}

pub fn floor_divide(left: &Value, right: &Value) -> EvalResult<Value> {
    if is_zero(right) && Num::of(left).is_some() {
        return Err(EvalError::ZeroDivision);
    }
    numeric_binop(
        left,
        right,
        BinaryOp::FloorDivide,
        |a, b| {
            let q = a.checked_div(b)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Some(q - 1)
            } else {
                Some(q)
            }
        },
        |a, b| (a / b).floor(),
    )
}

/// Modulo whose result takes the sign of the divisor
pub fn modulo(left: &Value, right: &Value) -> EvalResult<Value> {
    if is_zero(right) && Num::of(left).is_some() {
        return Err(EvalError::ZeroDivision);
    }
    numeric_binop(
        left,
        right,
        BinaryOp::Modulo,
        |a, b| {
            let r = a.checked_rem(b)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                Some(r + b)
            } else {
                Some(r)
            }
        },
        |a, b| {
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        },
    )
}

pub fn power(left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(base), Some(exp)) = (Num::of(left), Num::of(right)) else {
        return Err(EvalError::binary_type_error(
            "**",
            left.type_name(),
            right.type_name(),
        ));
    };
    if base.to_f64() == 0.0 && exp.to_f64() < 0.0 {
        return Err(EvalError::ZeroDivision);
    }
    match (base, exp) {
        (Num::Int(b), Num::Int(e)) if e >= 0 => {
            let result = u32::try_from(e).ok().and_then(|e| b.checked_pow(e));
            Ok(match result {
                Some(i) => Value::Integer(i),
                None => Value::Float((b as f64).powf(e as f64)),
            })
        }
        (b, e) => {
            let result = b.to_f64().powf(e.to_f64());
            if result.is_nan() {
                return Err(EvalError::bad_value("math domain error"));
            }
            Ok(Value::Float(result))
        }
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::Plus => match Num::of(operand) {
            Some(Num::Int(i)) => Ok(Value::Integer(i)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(EvalError::unary_type_error(
                "unary +",
                "a number",
                operand.type_name(),
            )),
        },
        UnaryOp::Negate => match Num::of(operand) {
            Some(Num::Int(i)) => Ok(i
                .checked_neg()
                .map_or(Value::Float(-(i as f64)), Value::Integer)),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(EvalError::unary_type_error(
                "unary -",
                "a number",
                operand.type_name(),
            )),
        },
    }
}

/// Ordering between two values of compatible kinds. Mixed kinds (a list
/// against a number, say) are a type error rather than a silent `false`.
/// `None` means the values are unordered (NaN).
pub fn ordering(left: &Value, right: &Value, symbol: &str) -> EvalResult<Option<Ordering>> {
    ordering_within(left, right, symbol, &mut Vec::new())
}

fn ordering_within(
    left: &Value,
    right: &Value,
    symbol: &str,
    seen: &mut Vec<(usize, usize)>,
) -> EvalResult<Option<Ordering>> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok(Some(l.cmp(r))),
        (Value::List(l), Value::List(r)) => {
            let pair = (Arc::as_ptr(l) as usize, Arc::as_ptr(r) as usize);
            if seen.contains(&pair) {
                return Err(EvalError::runtime(
                    "maximum recursion depth exceeded in comparison",
                ));
            }
            let (l, r) = (l.read().clone(), r.read().clone());
            seen.push(pair);
            let mut result = Ok(Some(l.len().cmp(&r.len())));
            for (a, b) in l.iter().zip(r.iter()) {
                if a != b {
                    result = ordering_within(a, b, symbol, seen);
                    break;
                }
            }
            seen.pop();
            result
        }
        _ => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(l)), Some(Num::Int(r))) => Ok(Some(l.cmp(&r))),
            (Some(l), Some(r)) => Ok(l.to_f64().partial_cmp(&r.to_f64())),
            _ => Err(EvalError::Type {
                message: format!(
                    "'{symbol}' not supported between instances of '{}' and '{}'",
                    left.type_name(),
                    right.type_name()
                ),
            }),
        },
    }
}

/// Membership test behind `in`
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::Type {
                message: format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ),
            }),
        },
        Value::List(items) => Ok(items.read().iter().any(|candidate| candidate == item)),
        Value::Record(props) => Ok(match item {
            Value::String(key) => props.read().contains_key(key),
            _ => false,
        }),
        other => Err(EvalError::Type {
            message: format!("argument of type '{}' is not iterable", other.type_name()),
        }),
    }
}

/// Subscript `target[index]`.
///
/// Lists and strings take an integral position (negative counts from the
/// end); a whole float or a numeric string also qualifies. Records look the
/// index up as a key and yield `None` when it is absent.
pub fn index(target: &Value, index: &Value) -> EvalResult<Value> {
    match target {
        Value::List(items) => {
            let items = items.read();
            let position = position(index, items.len())?;
            Ok(items[position].clone())
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = position(index, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        Value::Record(props) => Ok(match index {
            Value::String(key) => props.read().get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }),
        other => Err(EvalError::Type {
            message: format!("'{}' object is not subscriptable", other.type_name()),
        }),
    }
}

fn position(index: &Value, len: usize) -> EvalResult<usize> {
    let raw = match index {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        other => other.as_integral(),
    };
    let resolved = raw.and_then(|i| {
        let len = i64::try_from(len).ok()?;
        let i = if i < 0 { i + len } else { i };
        (0..len).contains(&i).then_some(i as usize)
    });
    resolved.ok_or_else(|| EvalError::bad_index(index))
}

pub fn compare(op: CompareOp, left: &Value, right: &Value) -> EvalResult<bool> {
    let ordered = |symbol: &str, accept: fn(Ordering) -> bool| -> EvalResult<bool> {
        Ok(ordering(left, right, symbol)?.is_some_and(accept))
    };
    match op {
        CompareOp::Equal => Ok(left == right),
        CompareOp::NotEqual => Ok(left != right),
        CompareOp::LessThan => ordered("<", Ordering::is_lt),
        CompareOp::LessEqual => ordered("<=", Ordering::is_le),
        CompareOp::GreaterThan => ordered(">", Ordering::is_gt),
        CompareOp::GreaterEqual => ordered(">=", Ordering::is_ge),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_is_float() {
        assert_eq!(
            divide(&Value::Integer(10), &Value::Integer(4)).unwrap(),
            Value::Float(2.5)
        );
        assert!(matches!(
            divide(&Value::Integer(1), &Value::Integer(0)),
            Err(EvalError::ZeroDivision)
        ));
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(
            floor_divide(&Value::Integer(-7), &Value::Integer(2)).unwrap(),
            Value::Integer(-4)
        );
        assert_eq!(
            modulo(&Value::Integer(-7), &Value::Integer(3)).unwrap(),
            Value::Integer(2)
        );
        assert!(matches!(
            modulo(&Value::Integer(1), &Value::Integer(0)),
            Err(EvalError::ZeroDivision)
        ));
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let result = add(&Value::Integer(i64::MAX), &Value::Integer(1)).unwrap();
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn test_string_and_list_operations() {
        assert_eq!(
            add(&"ab".into(), &"cd".into()).unwrap(),
            Value::string("abcd")
        );
        assert_eq!(
            multiply(&"ab".into(), &Value::Integer(3)).unwrap(),
            Value::string("ababab")
        );
        let joined = add(
            &Value::list(vec![Value::Integer(1)]),
            &Value::list(vec![Value::Integer(2)]),
        )
        .unwrap();
        assert_eq!(joined.to_string(), "[1, 2]");
    }

    #[test]
    fn test_repetition_length_is_capped() {
        let huge = Value::Integer(i64::MAX);
        let err = multiply(&"ab".into(), &huge).unwrap_err();
        assert_eq!(err.to_string(), "repeated sequence is too long");
        let pair = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(matches!(
            multiply(&pair, &huge),
            Err(EvalError::Value { .. })
        ));
        assert_eq!(multiply(&"".into(), &huge).unwrap(), Value::string(""));
        assert_eq!(
            multiply(&Value::list(vec![]), &huge).unwrap().to_string(),
            "[]"
        );
        assert_eq!(multiply(&pair, &Value::Integer(2)).unwrap().to_string(), "[1, 2, 1, 2]");
        assert_eq!(multiply(&pair, &Value::Integer(-3)).unwrap().to_string(), "[]");
    }

    #[test]
    fn test_ordering_self_containing_lists_is_error() {
        let first = Value::list(vec![]);
        let second = Value::list(vec![]);
        for (list, tail) in [(&first, 1), (&second, 2)] {
            if let Value::List(items) = list {
                items.write().push(list.clone());
                items.write().push(Value::Integer(tail));
            }
        }
        assert_ne!(first, second);
        let err = compare(CompareOp::LessThan, &first, &second).unwrap_err();
        assert_eq!(err.kind(), crate::evaluator::errors::ErrorKind::Runtime);
    }

    #[test]
    fn test_mixed_add_is_type_error() {
        let err = add(&"score: ".into(), &Value::Integer(5)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operand types for +: 'string' and 'integer'"
        );
    }

    #[test]
    fn test_ordering_list_against_number_is_error() {
        assert!(compare(
            CompareOp::LessThan,
            &Value::list(vec![]),
            &Value::Integer(1)
        )
        .is_err());
        assert!(!compare(CompareOp::Equal, &Value::list(vec![]), &Value::Integer(1)).unwrap());
    }

    #[test]
    fn test_power() {
        assert_eq!(
            power(&Value::Integer(2), &Value::Integer(10)).unwrap(),
            Value::Integer(1024)
        );
        assert_eq!(
            power(&Value::Integer(2), &Value::Integer(-1)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_index() {
        let items = Value::list(vec![Value::Integer(10), Value::Integer(20)]);
        assert_eq!(index(&items, &Value::Integer(-1)).unwrap(), Value::Integer(20));
        assert_eq!(index(&items, &Value::Float(1.0)).unwrap(), Value::Integer(20));
        assert_eq!(
            index(&items, &Value::Integer(5)).unwrap_err().to_string(),
            "Index out of range or invalid: 5"
        );
        assert_eq!(index(&"hey".into(), &"1".into()).unwrap(), Value::string("e"));
        assert!(index(&Value::Integer(3), &Value::Integer(0)).is_err());
    }

    #[test]
    fn test_membership() {
        let items = Value::list(vec!["sword".into(), "shield".into()]);
        assert!(compare(CompareOp::In, &"sword".into(), &items).unwrap());
        assert!(compare(CompareOp::NotIn, &"bow".into(), &items).unwrap());
        assert!(compare(CompareOp::In, &"ell".into(), &"hello".into()).unwrap());
    }
}
