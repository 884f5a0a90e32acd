//! Built-in method dispatch.
//!
//! The value kinds are a closed set, so dispatch is a `match` on the
//! receiver rather than a trait per kind. Each kind has a method table used
//! both for dispatch and for did-you-mean suggestions.
//!
//! # Module Structure
//!
//! - [`helpers`]: argument validation and shared utilities
//! - [`numeric`]: INTEGER and FLOAT
//! - [`string`]: STRING
//! - [`collections`]: ARRAY, TUPLE and RANGE
//! - [`hash`]: HASH
//! - [`misc`]: BOOLEAN, NIL, CHANNEL, callables, and scope-backed values

mod collections;
mod hash;
mod helpers;
mod misc;
mod numeric;
mod string;

pub use collections::slice_bounds;
pub use helpers::{len_to_value, resolve_index};
pub(crate) use helpers::{no_such_method, require_args, require_args_between, require_callable_arg, require_int_arg};

use crate::errors::EvalResult;
use crate::value::CallContext;
use crate::Value;

/// Dispatch `receiver.name(args)` to the receiver kind's method table.
#[tracing::instrument(level = "trace", skip_all, fields(kind = receiver.kind(), method = name))]
pub fn call_method(
    ctx: &mut dyn CallContext,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
) -> EvalResult {
    let pos = ctx.position();
    match receiver {
        Value::Int(_) => numeric::dispatch_int_method(pos, receiver, name, args),
        Value::Float(_) => numeric::dispatch_float_method(pos, receiver, name, args),
        Value::Str(_) => string::dispatch_string_method(pos, receiver, name, args),
        Value::Bool(_) | Value::Nil(_) => misc::dispatch_scalar_method(pos, receiver, name, args),
        Value::Array(items) => collections::dispatch_array_method(ctx, receiver, items, name, args),
        Value::Tuple(t) => collections::dispatch_tuple_method(pos, receiver, t, name, &args),
        Value::Range(r) => collections::dispatch_range_method(pos, *r, name, &args),
        Value::Hash(h) => hash::dispatch_hash_method(ctx, receiver, h, name, args),
        Value::Channel(ch) => misc::dispatch_channel_method(pos, ch, name, args),
        Value::Function(_) | Value::Builtin(_) => {
            misc::dispatch_callable_method(ctx, receiver, name, args)
        }
        Value::Struct(s) => misc::dispatch_scoped_method(ctx, receiver, &s.scope, name, args),
        Value::Enum(e) => misc::dispatch_scoped_method(ctx, receiver, &e.scope, name, args),
        Value::Module(m) => misc::dispatch_scoped_method(ctx, receiver, &m.scope, name, args),
        Value::Host(h) => h.call_method(ctx, name, args),
    }
}

/// Method names available on `value`, for suggestions and introspection.
pub fn method_names(value: &Value) -> Vec<&str> {
    let table: &[&str] = match value {
        Value::Int(_) => numeric::INT_METHODS,
        Value::Float(_) => numeric::FLOAT_METHODS,
        Value::Str(_) => string::STRING_METHODS,
        Value::Bool(_) => misc::BOOL_METHODS,
        Value::Nil(_) => misc::NIL_METHODS,
        Value::Array(_) => collections::ARRAY_METHODS,
        Value::Tuple(_) => collections::TUPLE_METHODS,
        Value::Range(_) => collections::RANGE_METHODS,
        Value::Hash(_) => hash::HASH_METHODS,
        Value::Channel(_) => misc::CHANNEL_METHODS,
        Value::Function(_) | Value::Builtin(_) => misc::FUNCTION_METHODS,
        Value::Host(h) => h.methods(),
        Value::Struct(_) | Value::Enum(_) | Value::Module(_) => &[],
    };
    table.to_vec()
}
