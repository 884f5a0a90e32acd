//! Global builtin functions.
//!
//! Builtins are resolved after scope bindings, so a script may shadow any of
//! them with its own definition. They reach the evaluator only through
//! [`CallContext`], which is also how they write output.

mod format;

pub use format::format_values;

use crate::errors::{
    argument_count, assertion_failed, conversion_error, host_error, input_type, param_type,
    EvalResult,
};
use crate::methods::len_to_value;
use crate::value::{Builtin, CallContext};
use crate::Value;

/// The builtin table, in alphabetical order.
pub const BUILTINS: &[Builtin] = &[
    Builtin::new("assert", builtin_assert),
    Builtin::new("chan", builtin_chan),
    Builtin::new("float", builtin_float),
    Builtin::new("fprintf", builtin_fprintf),
    Builtin::new("int", builtin_int),
    Builtin::new("len", builtin_len),
    Builtin::new("print", builtin_print),
    Builtin::new("printf", builtin_printf),
    Builtin::new("println", builtin_println),
    Builtin::new("range", builtin_range),
    Builtin::new("str", builtin_str),
    Builtin::new("type", builtin_type),
];

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .binary_search_by(|b| b.name.cmp(name))
        .ok()
        .map(|i| BUILTINS[i])
}

/// Every builtin name, for suggestions.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

fn arity(ctx: &dyn CallContext, name: &str, expected: usize, args: &[Value]) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(argument_count(ctx.position(), name, expected, args.len()).into())
    }
}

fn join_display(args: &[Value]) -> String {
    args.iter().map(Value::display).collect::<Vec<_>>().join(" ")
}

fn builtin_print(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    ctx.output().print(&join_display(&args));
    Ok(Value::nil())
}

fn builtin_println(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    ctx.output().println(&join_display(&args));
    Ok(Value::nil())
}

fn builtin_printf(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    let Some((fmt, rest)) = args.split_first() else {
        return Err(argument_count(pos, "printf", "at least 1", 0).into());
    };
    let fmt = fmt
        .as_str()
        .ok_or_else(|| param_type(pos, "printf", 1, "STRING", fmt.kind()))?;
    let text = format_values(pos, fmt, rest)?;
    ctx.output().print(&text);
    Ok(Value::nil())
}

/// `fprintf(writer, fmt, args...)`: format into a writable host object.
fn builtin_fprintf(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    if args.len() < 2 {
        return Err(argument_count(pos, "fprintf", "at least 2", args.len()).into());
    }
    let fmt = args[1]
        .as_str()
        .ok_or_else(|| param_type(pos, "fprintf", 2, "STRING", args[1].kind()))?;
    let text = format_values(pos, fmt, &args[2..])?;
    let Value::Host(writer) = &args[0] else {
        return Err(input_type(pos, "fprintf", args[0].kind()).into());
    };
    match writer.write_str(&text) {
        Some(Ok(())) => Ok(Value::nil()),
        Some(Err(message)) => Err(host_error(pos, message).into()),
        None => Err(input_type(pos, "fprintf", writer.kind()).into()),
    }
}

fn builtin_len(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    arity(ctx, "len", 1, &args)?;
    let len = match &args[0] {
        Value::Str(s) if s.is_valid() => s.raw().chars().count(),
        Value::Array(items) => items.read().len(),
        Value::Hash(h) => h.read().len(),
        Value::Tuple(t) => t.items.len(),
        Value::Range(r) => r.len(),
        Value::Channel(ch) => ch.len(),
        other => return Err(input_type(ctx.position(), "len", other.kind()).into()),
    };
    Ok(len_to_value(len))
}

fn builtin_type(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    arity(ctx, "type", 1, &args)?;
    Ok(Value::string(args[0].kind()))
}

fn builtin_str(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    arity(ctx, "str", 1, &args)?;
    Ok(Value::string(args[0].display()))
}

fn builtin_int(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    arity(ctx, "int", 1, &args)?;
    let pos = ctx.position();
    match &args[0] {
        Value::Int(_) => Ok(args[0].clone()),
        Value::Bool(b) if b.valid => Ok(Value::int(i64::from(b.value))),
        v @ (Value::Float(_) | Value::Str(_)) => {
            crate::methods::call_method(ctx, v, "int", Vec::new())
        }
        other => Err(conversion_error(pos, &other.inspect(), "INTEGER").into()),
    }
}

fn builtin_float(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    arity(ctx, "float", 1, &args)?;
    let pos = ctx.position();
    match &args[0] {
        Value::Float(_) => Ok(args[0].clone()),
        v @ (Value::Int(_) | Value::Str(_)) => {
            crate::methods::call_method(ctx, v, "float", Vec::new())
        }
        other => Err(conversion_error(pos, &other.inspect(), "FLOAT").into()),
    }
}

fn builtin_assert(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    if !(1..=2).contains(&args.len()) {
        return Err(argument_count(pos, "assert", "1 to 2", args.len()).into());
    }
    if args[0].is_truthy() {
        return Ok(Value::nil());
    }
    let message = args
        .get(1)
        .map_or_else(|| format!("{} is not truthy", args[0].inspect()), Value::display);
    Err(assertion_failed(pos, &message).into())
}

/// `chan()` is unbuffered; `chan(n)` buffers `n` values.
fn builtin_chan(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    match args.as_slice() {
        [] => Ok(Value::channel(0)),
        [cap] => {
            let cap = cap
                .as_int()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| param_type(pos, "chan", 1, "non-negative INTEGER", cap.kind()))?;
            Ok(Value::channel(cap))
        }
        _ => Err(argument_count(pos, "chan", "0 to 1", args.len()).into()),
    }
}

/// `range(n)` is `0..n-1`; `range(a, b)` is `a..b`.
fn builtin_range(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    let int_at = |i: usize| {
        args[i]
            .as_int()
            .ok_or_else(|| param_type(pos, "range", i + 1, "INTEGER", args[i].kind()))
    };
    match args.len() {
        1 => {
            let n = int_at(0)?;
            Ok(Value::range(0, n.saturating_sub(1)))
        }
        2 => Ok(Value::range(int_at(0)?, int_at(1)?)),
        got => Err(argument_count(pos, "range", "1 to 2", got).into()),
    }
}
