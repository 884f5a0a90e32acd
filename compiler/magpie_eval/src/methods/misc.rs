//! Methods on BOOLEAN, NIL, CHANNEL and callable values, and member
//! dispatch for scope-backed values (structs, enums, modules).

use magpie_ir::Position;

use super::helpers::{len_to_value, no_such_method, require_args};
use super::numeric::set_valid;
use crate::environment::Scope;
use crate::errors::{channel_closed, unknown_member, EvalResult};
use crate::suggest::suggest_similar;
use crate::value::{CallContext, ChannelValue};
use crate::Value;

pub const BOOL_METHODS: &[&str] = &["isValid", "message", "setValid", "toString"];

pub const NIL_METHODS: &[&str] = &["isValid", "message", "toString"];

pub const CHANNEL_METHODS: &[&str] = &["close", "recv", "send"];

pub const FUNCTION_METHODS: &[&str] = &["arity", "call", "name"];

#[expect(
    clippy::needless_pass_by_value,
    reason = "Consistent method dispatch signature"
)]
pub fn dispatch_scalar_method(
    pos: Position,
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    let (kind, table) = match receiver {
        Value::Nil(_) => ("NIL", NIL_METHODS),
        _ => ("BOOLEAN", BOOL_METHODS),
    };
    match method {
        "isValid" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::boolean(receiver.is_valid()))
        }
        "setValid" if kind == "BOOLEAN" => set_valid(pos, receiver, &args),
        "message" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(receiver.failure_message().unwrap_or("")))
        }
        "toString" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(receiver.display()))
        }
        _ => Err(no_such_method(pos, method, kind, table).into()),
    }
}

pub fn dispatch_channel_method(
    pos: Position,
    channel: &ChannelValue,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    match method {
        "send" => {
            require_args(pos, method, 1, &args)?;
            let value = args.into_iter().next().unwrap_or_else(Value::nil);
            channel
                .send(value)
                .map(|()| Value::nil())
                .map_err(|_| channel_closed(pos).into())
        }
        "recv" => {
            require_args(pos, method, 0, &args)?;
            Ok(channel.recv().unwrap_or_else(Value::nil))
        }
        "close" => {
            require_args(pos, method, 0, &args)?;
            channel.close();
            Ok(Value::nil())
        }
        _ => Err(no_such_method(pos, method, "CHANNEL", CHANNEL_METHODS).into()),
    }
}

pub fn dispatch_callable_method(
    ctx: &mut dyn CallContext,
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    let pos = ctx.position();
    match (method, receiver) {
        ("call", _) => ctx.call(receiver, args),
        ("name", Value::Function(f)) => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(f.name()))
        }
        ("name", Value::Builtin(b)) => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(b.name))
        }
        ("arity", Value::Function(f)) => {
            require_args(pos, method, 0, &args)?;
            Ok(len_to_value(f.arity()))
        }
        _ => Err(no_such_method(pos, method, receiver.kind(), FUNCTION_METHODS).into()),
    }
}

/// Member call on a struct, enum or module: look `name` up in its scope.
///
/// A callable member is invoked; a plain member is returned when called
/// with no arguments.
pub fn dispatch_scoped_method(
    ctx: &mut dyn CallContext,
    receiver: &Value,
    scope: &Scope,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    let pos = ctx.position();
    match scope.get_local(method) {
        Some(member) if member.is_callable() => ctx.call(&member, args),
        Some(member) if args.is_empty() => Ok(member),
        _ if method == "toString" && args.is_empty() => Ok(Value::string(receiver.display())),
        _ => {
            let members = scope.local_bindings();
            let suggestion = suggest_similar(method, members.iter().map(|(n, _)| &**n));
            Err(unknown_member(pos, method, receiver.kind(), suggestion).into())
        }
    }
}
