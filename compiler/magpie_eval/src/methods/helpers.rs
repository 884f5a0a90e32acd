//! Argument validation shared by the method tables.

use magpie_ir::Position;

use crate::errors::{argument_count, no_method, param_type, EvalError};
use crate::suggest::suggest_similar;
use crate::Value;

/// Validate an exact argument count.
#[inline]
pub fn require_args(
    pos: Position,
    method: &str,
    expected: usize,
    args: &[Value],
) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(argument_count(pos, method, expected, args.len()))
    }
}

/// Validate an argument count within `min..=max`.
#[inline]
pub fn require_args_between(
    pos: Position,
    method: &str,
    min: usize,
    max: usize,
    args: &[Value],
) -> Result<(), EvalError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(argument_count(pos, method, format!("{min} to {max}"), args.len()))
    }
}

/// Extract a valid integer argument.
pub fn require_int_arg(
    pos: Position,
    method: &str,
    args: &[Value],
    index: usize,
) -> Result<i64, EvalError> {
    let arg = arg_at(pos, method, args, index)?;
    arg.as_int()
        .ok_or_else(|| param_type(pos, method, index + 1, "INTEGER", arg.kind()))
}

/// Extract a valid string argument.
pub fn require_str_arg<'a>(
    pos: Position,
    method: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, EvalError> {
    let arg = arg_at(pos, method, args, index)?;
    arg.as_str()
        .ok_or_else(|| param_type(pos, method, index + 1, "STRING", arg.kind()))
}

/// Extract a callable argument.
pub fn require_callable_arg<'a>(
    pos: Position,
    method: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, EvalError> {
    let arg = arg_at(pos, method, args, index)?;
    if arg.is_callable() {
        Ok(arg)
    } else {
        Err(param_type(pos, method, index + 1, "FUNCTION", arg.kind()))
    }
}

fn arg_at<'a>(
    pos: Position,
    method: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Value, EvalError> {
    args.get(index)
        .ok_or_else(|| argument_count(pos, method, index + 1, args.len()))
}

/// `NoMethodError`, suggesting the closest name in `table`.
#[cold]
pub fn no_such_method(pos: Position, method: &str, kind: &str, table: &[&str]) -> EvalError {
    no_method(pos, method, kind, suggest_similar(method, table.iter().copied()))
}

/// Convert a length to an integer value.
pub fn len_to_value(len: usize) -> Value {
    Value::int(i64::try_from(len).unwrap_or(i64::MAX))
}

/// Arguments for a per-element callback: the element, plus its index when
/// the callback declares a second parameter.
pub fn element_args(callback: &Value, item: Value, index: usize) -> Vec<Value> {
    match callback {
        Value::Function(f) if f.arity() >= 2 => vec![item, len_to_value(index)],
        _ => vec![item],
    }
}

/// Resolve a possibly negative index against `len`.
pub fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len_i = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len_i } else { index };
    usize::try_from(resolved).ok().filter(|i| *i < len)
}
