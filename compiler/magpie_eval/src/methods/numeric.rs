//! Methods on INTEGER and FLOAT values.

use magpie_ir::Position;

use super::helpers::{no_such_method, require_args};
use crate::errors::{conversion_error, input_type, integer_overflow, param_type, EvalResult};
use crate::Value;

pub const INT_METHODS: &[&str] = &[
    "abs", "float", "int", "isValid", "setValid", "sqrt", "toString",
];

pub const FLOAT_METHODS: &[&str] = &[
    "abs", "ceil", "float", "floor", "int", "isValid", "round", "setValid", "sqrt", "toString",
];

/// `setValid(bool)` for any nullable scalar.
pub fn set_valid(pos: Position, receiver: &Value, args: &[Value]) -> EvalResult {
    require_args(pos, "setValid", 1, args)?;
    let Value::Bool(flag) = &args[0] else {
        return Err(param_type(pos, "setValid", 1, "BOOLEAN", args[0].kind()).into());
    };
    let valid = flag.value;
    Ok(match receiver {
        Value::Int(n) => Value::Int(n.with_valid(valid)),
        Value::Float(x) => Value::Float(x.with_valid(valid)),
        Value::Str(s) => Value::Str(s.clone().with_valid(valid)),
        Value::Bool(b) => {
            let mut b = b.clone();
            b.valid = valid;
            Value::Bool(b)
        }
        other => other.clone(),
    })
}

#[expect(
    clippy::cast_precision_loss,
    reason = "int to float conversion is the language semantics"
)]
#[expect(
    clippy::needless_pass_by_value,
    reason = "Consistent method dispatch signature"
)]
pub fn dispatch_int_method(pos: Position, receiver: &Value, method: &str, args: Vec<Value>) -> EvalResult {
    match method {
        "isValid" => {
            require_args(pos, method, 0, &args)?;
            return Ok(Value::boolean(receiver.is_valid()));
        }
        "setValid" => return set_valid(pos, receiver, &args),
        "toString" => {
            require_args(pos, method, 0, &args)?;
            return Ok(Value::string(receiver.display()));
        }
        _ => {}
    }
    if !INT_METHODS.contains(&method) {
        return Err(no_such_method(pos, method, "INTEGER", INT_METHODS).into());
    }
    let Some(n) = receiver.as_int() else {
        return Err(input_type(pos, method, "invalid INTEGER").into());
    };
    require_args(pos, method, 0, &args)?;
    match method {
        "abs" => n
            .checked_abs()
            .map(Value::int)
            .ok_or_else(|| integer_overflow(pos, "abs").into()),
        "float" => Ok(Value::float(n as f64)),
        "sqrt" => Ok(Value::float((n as f64).sqrt())),
        _ => Ok(Value::int(n)),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast"
)]
#[expect(
    clippy::cast_precision_loss,
    reason = "i64 bounds are compared as floats"
)]
fn float_to_int(pos: Position, x: f64) -> EvalResult {
    let t = x.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Ok(Value::int(t as i64))
    } else {
        Err(conversion_error(pos, &x.to_string(), "INTEGER").into())
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Consistent method dispatch signature"
)]
pub fn dispatch_float_method(
    pos: Position,
    receiver: &Value,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    match method {
        "isValid" => {
            require_args(pos, method, 0, &args)?;
            return Ok(Value::boolean(receiver.is_valid()));
        }
        "setValid" => return set_valid(pos, receiver, &args),
        "toString" => {
            require_args(pos, method, 0, &args)?;
            return Ok(Value::string(receiver.display()));
        }
        _ => {}
    }
    if !FLOAT_METHODS.contains(&method) {
        return Err(no_such_method(pos, method, "FLOAT", FLOAT_METHODS).into());
    }
    let Some(x) = receiver.as_number() else {
        return Err(input_type(pos, method, "invalid FLOAT").into());
    };
    require_args(pos, method, 0, &args)?;
    match method {
        "abs" => Ok(Value::float(x.abs())),
        "ceil" => Ok(Value::float(x.ceil())),
        "floor" => Ok(Value::float(x.floor())),
        "round" => Ok(Value::float(x.round())),
        "sqrt" => Ok(Value::float(x.sqrt())),
        "int" => float_to_int(pos, x),
        _ => Ok(Value::float(x)),
    }
}
