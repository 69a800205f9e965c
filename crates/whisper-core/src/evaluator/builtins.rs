//! The fixed set of functions callable from expression text.
//!
//! Nothing outside this table is reachable from a program's expressions.

use rand::{rngs::StdRng, Rng};

use super::{
    errors::{EvalError, EvalResult},
    ops, Value,
};

pub const BUILTINS: &[&str] = &[
    "sqrt", "pow", "abs", "round", "floor", "ceil", "random", "randint", "min", "max", "sum",
    "len", "str", "list",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub fn call(name: &str, args: Vec<Value>, rng: &mut StdRng) -> EvalResult<Value> {
    match name {
        "sqrt" => {
            let [x] = exact::<1>(name, args)?;
            let x = number(name, &x)?;
            if x < 0.0 {
                return Err(EvalError::bad_value("math domain error"));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "pow" => {
            let [base, exp] = exact::<2>(name, args)?;
            let (base, exp) = (number(name, &base)?, number(name, &exp)?);
            let result = base.powf(exp);
            if result.is_nan() || (base == 0.0 && exp < 0.0) {
                return Err(EvalError::bad_value("math domain error"));
            }
            Ok(Value::Float(result))
        }
        "abs" => {
            let [x] = exact::<1>(name, args)?;
            match x {
                Value::Integer(i) => Ok(i
                    .checked_abs()
                    .map_or(Value::Float((i as f64).abs()), Value::Integer)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(b))),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(bad_operand(name, &other)),
            }
        }
        "round" => round(args),
        "floor" => {
            let [x] = exact::<1>(name, args)?;
            to_integer(number(name, &x)?.floor())
        }
        "ceil" => {
            let [x] = exact::<1>(name, args)?;
            to_integer(number(name, &x)?.ceil())
        }
        "random" => {
            exact::<0>(name, args)?;
            Ok(Value::Float(rng.gen::<f64>()))
        }
        "randint" => {
            let [low, high] = exact::<2>(name, args)?;
            let (low, high) = (integer(name, &low)?, integer(name, &high)?);
            if low > high {
                return Err(EvalError::bad_value(format!(
                    "empty range for randint({low}, {high})"
                )));
            }
            Ok(Value::Integer(rng.gen_range(low..=high)))
        }
        "min" => extreme(name, args, std::cmp::Ordering::Less),
        "max" => extreme(name, args, std::cmp::Ordering::Greater),
        "sum" => sum(args),
        "len" => {
            let [x] = exact::<1>(name, args)?;
            let length = match &x {
                Value::String(s) => s.chars().count(),
                Value::List(items) => items.read().len(),
                Value::Record(props) => props.read().len(),
                other => {
                    return Err(EvalError::Type {
                        message: format!("object of type '{}' has no len()", other.type_name()),
                    })
                }
            };
            Ok(Value::Integer(length as i64))
        }
        "str" => match args.len() {
            0 => Ok(Value::string("")),
            1 => Ok(Value::String(args[0].to_string())),
            n => Err(arity(name, 1, n)),
        },
        "list" => match args.as_slice() {
            [] => Ok(Value::list(Vec::new())),
            [Value::String(s)] => Ok(Value::list(
                s.chars().map(|c| Value::String(c.to_string())).collect(),
            )),
            [Value::List(items)] => Ok(Value::list(items.read().clone())),
            [Value::Record(props)] => Ok(Value::list(
                props.read().keys().map(|k| Value::String(k.clone())).collect(),
            )),
            [other] => Err(EvalError::Type {
                message: format!("'{}' object is not iterable", other.type_name()),
            }),
            _ => Err(arity(name, 1, args.len())),
        },
        other => Err(EvalError::undefined(other)),
    }
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| arity(name, N, given))
}

fn arity(name: &str, expected: usize, given: usize) -> EvalError {
    let noun = if expected == 1 { "argument" } else { "arguments" };
    EvalError::Type {
        message: format!("{name}() takes {expected} {noun} ({given} given)"),
    }
}

fn bad_operand(name: &str, value: &Value) -> EvalError {
    EvalError::unary_type_error(&format!("{name}()"), "a number", value.type_name())
}

fn number(name: &str, value: &Value) -> EvalResult<f64> {
    value.as_f64().ok_or_else(|| bad_operand(name, value))
}

fn integer(name: &str, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Boolean(b) => Ok(i64::from(*b)),
        other => Err(EvalError::unary_type_error(
            &format!("{name}()"),
            "an integer",
            other.type_name(),
        )),
    }
}

fn to_integer(f: f64) -> EvalResult<Value> {
    if !f.is_finite() {
        return Err(EvalError::bad_value(format!(
            "cannot convert float {} to integer",
            super::value::format_float(f)
        )));
    }
    if f.abs() < 9.2e18 {
        Ok(Value::Integer(f as i64))
    } else {
        Ok(Value::Float(f))
    }
}

/// Round half to even; with a digit count the result stays a float
fn round(args: Vec<Value>) -> EvalResult<Value> {
    match args.as_slice() {
        [x] => match x {
            Value::Integer(_) | Value::Boolean(_) => Ok(Value::Integer(x.as_integral().unwrap_or(0))),
            _ => to_integer(number("round", x)?.round_ties_even()),
        },
        [x, digits] => {
            let digits = integer("round", digits)?;
            match x {
                Value::Integer(i) if digits >= 0 => Ok(Value::Integer(*i)),
                _ => {
                    let value = number("round", x)?;
                    let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
                    let scaled = value * scale;
                    if !scaled.is_finite() {
                        return Ok(Value::Float(value));
                    }
                    Ok(Value::Float(scaled.round_ties_even() / scale))
                }
            }
        }
        other => Err(arity("round", 1, other.len())),
    }
}

/// Shared body of `min` and `max`: either a single list or several arguments
fn extreme(name: &str, args: Vec<Value>, wanted: std::cmp::Ordering) -> EvalResult<Value> {
    let candidates = match args.as_slice() {
        [Value::List(items)] => items.read().clone(),
        [Value::String(s)] => s.chars().map(|c| Value::String(c.to_string())).collect(),
        _ => args,
    };
    let mut iter = candidates.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(EvalError::bad_value(format!("{name}() arg is an empty sequence")));
    };
    let symbol = if wanted == std::cmp::Ordering::Less { "<" } else { ">" };
    for candidate in iter {
        if ops::ordering(&candidate, &best, symbol)? == Some(wanted) {
            best = candidate;
        }
    }
    Ok(best)
}

fn sum(args: Vec<Value>) -> EvalResult<Value> {
    let (items, start) = match args.as_slice() {
        [items] => (items.clone(), Value::Integer(0)),
        [items, start] => (items.clone(), start.clone()),
        other => return Err(arity("sum", 1, other.len())),
    };
    let Value::List(items) = items else {
        return Err(EvalError::Type {
            message: format!("'{}' object is not iterable", items.type_name()),
        });
    };
    if start.is_string() {
        return Err(EvalError::Type {
            message: "sum() can't sum strings".to_string(),
        });
    }
    let items = items.read().clone();
    items.iter().try_fold(start, |total, item| ops::add(&total, item))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn run(name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let mut rng = StdRng::seed_from_u64(7);
        call(name, args, &mut rng)
    }

    #[test]
    fn test_sqrt_and_domain_error() {
        assert_eq!(run("sqrt", vec![Value::Integer(16)]).unwrap(), Value::Float(4.0));
        assert_eq!(
            run("sqrt", vec![Value::Integer(-1)]).unwrap_err().to_string(),
            "math domain error"
        );
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(run("round", vec![Value::Float(2.5)]).unwrap(), Value::Integer(2));
        assert_eq!(run("round", vec![Value::Float(3.5)]).unwrap(), Value::Integer(4));
        assert_eq!(
            run("round", vec![Value::Float(3.14159), Value::Integer(2)]).unwrap(),
            Value::Float(3.14)
        );
    }

    #[test]
    fn test_floor_and_ceil_return_integers() {
        assert_eq!(run("floor", vec![Value::Float(2.7)]).unwrap(), Value::Integer(2));
        assert_eq!(run("ceil", vec![Value::Float(2.1)]).unwrap(), Value::Integer(3));
        assert!(matches!(
            run("floor", vec![Value::Float(-0.5)]).unwrap(),
            Value::Integer(-1)
        ));
    }

    #[test]
    fn test_min_max_accept_list_or_varargs() {
        let items = Value::list(vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]);
        assert_eq!(run("min", vec![items.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(run("max", vec![items]).unwrap(), Value::Integer(3));
        assert_eq!(
            run("max", vec![Value::Integer(4), Value::Float(4.5)]).unwrap(),
            Value::Float(4.5)
        );
        assert!(run("min", vec![Value::list(vec![])]).is_err());
    }

    #[test]
    fn test_sum_and_len() {
        let items = Value::list(vec![Value::Integer(1), Value::Float(2.5)]);
        assert_eq!(run("sum", vec![items.clone()]).unwrap(), Value::Float(3.5));
        assert_eq!(run("len", vec![items]).unwrap(), Value::Integer(2));
        assert_eq!(run("len", vec!["héllo".into()]).unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_randint_is_inclusive_and_checked() {
        for _ in 0..50 {
            let Value::Integer(n) = run("randint", vec![Value::Integer(1), Value::Integer(3)]).unwrap()
            else {
                panic!("randint must return an integer");
            };
            assert!((1..=3).contains(&n));
        }
        assert!(run("randint", vec![Value::Integer(5), Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_list_conversions() {
        assert_eq!(run("list", vec!["ab".into()]).unwrap().to_string(), "['a', 'b']");
        assert!(run("list", vec![Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(
            run("sqrt", vec![]).unwrap_err().to_string(),
            "sqrt() takes 1 argument (0 given)"
        );
    }
}
