//! Methods on ARRAY, TUPLE and RANGE values.
//!
//! Callbacks (`map`, `filter`, `reduce`, `each`) run against a snapshot of
//! the array, so a callback may mutate the array it is iterating.

use magpie_ir::Position;

use super::helpers::{
    element_args, len_to_value, no_such_method, require_args, require_args_between,
    require_callable_arg, require_int_arg, require_str_arg, resolve_index,
};
use crate::errors::{index_error, input_type, slice_error, EvalResult};
use crate::operators::{compare_values, values_equal};
use crate::value::{CallContext, RangeValue, Shared, TupleValue};
use crate::Value;

pub const ARRAY_METHODS: &[&str] = &[
    "contains", "each", "empty", "filter", "first", "index", "join", "last", "len", "map", "pop",
    "push", "reduce", "reverse", "slice", "sort", "toString",
];

pub const TUPLE_METHODS: &[&str] = &["get", "len", "toArray", "toString"];

pub const RANGE_METHODS: &[&str] = &["contains", "len", "toArray", "toString"];

pub fn dispatch_array_method(
    ctx: &mut dyn CallContext,
    receiver: &Value,
    items: &Shared<Vec<Value>>,
    method: &str,
    mut args: Vec<Value>,
) -> EvalResult {
    let pos = ctx.position();
    match method {
        "len" => {
            require_args(pos, method, 0, &args)?;
            Ok(len_to_value(items.read().len()))
        }
        "empty" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::boolean(items.read().is_empty()))
        }
        "toString" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(receiver.display()))
        }
        "push" => {
            items.write().append(&mut args);
            Ok(receiver.clone())
        }
        "pop" => {
            require_args(pos, method, 0, &args)?;
            Ok(items.write().pop().unwrap_or_else(Value::nil))
        }
        "first" => {
            require_args(pos, method, 0, &args)?;
            Ok(items.read().first().cloned().unwrap_or_else(Value::nil))
        }
        "last" => {
            require_args(pos, method, 0, &args)?;
            Ok(items.read().last().cloned().unwrap_or_else(Value::nil))
        }
        "contains" => {
            require_args(pos, method, 1, &args)?;
            let snapshot = items.snapshot();
            Ok(Value::boolean(
                snapshot.iter().any(|item| values_equal(item, &args[0], pos)),
            ))
        }
        "index" => {
            require_args(pos, method, 1, &args)?;
            let snapshot = items.snapshot();
            Ok(snapshot
                .iter()
                .position(|item| values_equal(item, &args[0], pos))
                .map_or(Value::int(-1), len_to_value))
        }
        "join" => {
            require_args_between(pos, method, 0, 1, &args)?;
            let sep = if args.is_empty() {
                ""
            } else {
                require_str_arg(pos, method, &args, 0)?
            };
            let parts: Vec<String> = items.read().iter().map(Value::display).collect();
            Ok(Value::string(parts.join(sep)))
        }
        "reverse" => {
            require_args(pos, method, 0, &args)?;
            let mut out = items.snapshot();
            out.reverse();
            Ok(Value::array(out))
        }
        "sort" => {
            require_args(pos, method, 0, &args)?;
            let mut out = items.snapshot();
            let comparable = out
                .windows(2)
                .all(|w| compare_values(&w[0], &w[1]).is_some());
            if !comparable {
                return Err(input_type(pos, method, "mixed or unordered ARRAY").into());
            }
            out.sort_by(|a, b| compare_values(a, b).unwrap_or(std::cmp::Ordering::Equal));
            Ok(Value::array(out))
        }
        "slice" => {
            require_args_between(pos, method, 1, 2, &args)?;
            let start = require_int_arg(pos, method, &args, 0)?;
            let snapshot = items.snapshot();
            let len = snapshot.len();
            let end = if args.len() == 2 {
                require_int_arg(pos, method, &args, 1)?
            } else {
                i64::try_from(len).unwrap_or(i64::MAX)
            };
            let (lo, hi) = slice_bounds(start, end, len)
                .ok_or_else(|| slice_error(pos, start, end, len))?;
            Ok(Value::array(snapshot[lo..hi].to_vec()))
        }
        "map" => {
            require_args(pos, method, 1, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            let mut out = Vec::new();
            for (i, item) in items.snapshot().into_iter().enumerate() {
                out.push(ctx.call(f, element_args(f, item, i))?);
            }
            Ok(Value::array(out))
        }
        "filter" => {
            require_args(pos, method, 1, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            let mut out = Vec::new();
            for (i, item) in items.snapshot().into_iter().enumerate() {
                if ctx.call(f, element_args(f, item.clone(), i))?.is_truthy() {
                    out.push(item);
                }
            }
            Ok(Value::array(out))
        }
        "each" => {
            require_args(pos, method, 1, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            for (i, item) in items.snapshot().into_iter().enumerate() {
                ctx.call(f, element_args(f, item, i))?;
            }
            Ok(receiver.clone())
        }
        "reduce" => {
            require_args_between(pos, method, 1, 2, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            let mut rest = items.snapshot().into_iter();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => match rest.next() {
                    Some(first) => first,
                    None => return Ok(Value::nil()),
                },
            };
            for item in rest {
                acc = ctx.call(f, vec![acc, item])?;
            }
            Ok(acc)
        }
        _ => Err(no_such_method(pos, method, "ARRAY", ARRAY_METHODS).into()),
    }
}

/// Resolve `[start:end]` against `len`; negative bounds count from the end.
pub fn slice_bounds(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len_i = i64::try_from(len).ok()?;
    let norm = |i: i64| if i < 0 { i + len_i } else { i };
    let (lo, hi) = (norm(start), norm(end));
    if lo < 0 || hi < lo || hi > len_i {
        return None;
    }
    Some((usize::try_from(lo).ok()?, usize::try_from(hi).ok()?))
}

pub fn dispatch_tuple_method(
    pos: Position,
    receiver: &Value,
    tuple: &TupleValue,
    method: &str,
    args: &[Value],
) -> EvalResult {
    match method {
        "len" => {
            require_args(pos, method, 0, args)?;
            Ok(len_to_value(tuple.items.len()))
        }
        "get" => {
            require_args(pos, method, 1, args)?;
            let index = require_int_arg(pos, method, args, 0)?;
            resolve_index(index, tuple.items.len())
                .map(|i| tuple.items[i].clone())
                .ok_or_else(|| index_error(pos, index, tuple.items.len()).into())
        }
        "toArray" => {
            require_args(pos, method, 0, args)?;
            Ok(Value::array(tuple.items.to_vec()))
        }
        "toString" => {
            require_args(pos, method, 0, args)?;
            Ok(Value::string(receiver.display()))
        }
        _ => Err(no_such_method(pos, method, "TUPLE", TUPLE_METHODS).into()),
    }
}

pub fn dispatch_range_method(
    pos: Position,
    range: RangeValue,
    method: &str,
    args: &[Value],
) -> EvalResult {
    match method {
        "len" => {
            require_args(pos, method, 0, args)?;
            Ok(len_to_value(range.len()))
        }
        "toArray" => {
            require_args(pos, method, 0, args)?;
            Ok(Value::array(range.iter().map(Value::int).collect()))
        }
        "contains" => {
            require_args(pos, method, 1, args)?;
            let n = require_int_arg(pos, method, args, 0)?;
            Ok(Value::boolean(range.contains(n)))
        }
        "toString" => {
            require_args(pos, method, 0, args)?;
            Ok(Value::string(format!("{}..{}", range.start, range.end)))
        }
        _ => Err(no_such_method(pos, method, "RANGE", RANGE_METHODS).into()),
    }
}
