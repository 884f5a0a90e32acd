//! Methods on STRING values.
//!
//! Lengths and indices count characters, not bytes.

use magpie_ir::Position;

use super::helpers::{
    len_to_value, no_such_method, require_args, require_args_between, require_str_arg,
};
use super::numeric::set_valid;
use crate::errors::{conversion_error, input_type, EvalResult};
use crate::Value;

pub const STRING_METHODS: &[&str] = &[
    "chars",
    "contains",
    "float",
    "hasPrefix",
    "hasSuffix",
    "index",
    "int",
    "isValid",
    "len",
    "lower",
    "replace",
    "reverse",
    "setValid",
    "split",
    "toString",
    "trim",
    "upper",
];

#[expect(
    clippy::needless_pass_by_value,
    reason = "Consistent method dispatch signature"
)]
pub fn dispatch_string_method(
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
    if !STRING_METHODS.contains(&method) {
        return Err(no_such_method(pos, method, "STRING", STRING_METHODS).into());
    }
    let Some(s) = receiver.as_str() else {
        return Err(input_type(pos, method, "invalid STRING").into());
    };

    match method {
        "len" => {
            require_args(pos, method, 0, &args)?;
            Ok(len_to_value(s.chars().count()))
        }
        "upper" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "lower" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "trim" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(s.trim()))
        }
        "reverse" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(s.chars().rev().collect::<String>()))
        }
        "chars" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::array(
                s.chars().map(|c| Value::string(c.to_string())).collect(),
            ))
        }
        "split" => {
            require_args_between(pos, method, 0, 1, &args)?;
            let parts: Vec<Value> = if args.is_empty() {
                s.split_whitespace().map(Value::string).collect()
            } else {
                let sep = require_str_arg(pos, method, &args, 0)?;
                if sep.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(sep).map(Value::string).collect()
                }
            };
            Ok(Value::array(parts))
        }
        "contains" => {
            require_args(pos, method, 1, &args)?;
            Ok(Value::boolean(s.contains(require_str_arg(pos, method, &args, 0)?)))
        }
        "hasPrefix" => {
            require_args(pos, method, 1, &args)?;
            Ok(Value::boolean(s.starts_with(require_str_arg(pos, method, &args, 0)?)))
        }
        "hasSuffix" => {
            require_args(pos, method, 1, &args)?;
            Ok(Value::boolean(s.ends_with(require_str_arg(pos, method, &args, 0)?)))
        }
        "replace" => {
            require_args(pos, method, 2, &args)?;
            let from = require_str_arg(pos, method, &args, 0)?;
            let to = require_str_arg(pos, method, &args, 1)?;
            Ok(Value::string(s.replace(from, to)))
        }
        "index" => {
            require_args(pos, method, 1, &args)?;
            let needle = require_str_arg(pos, method, &args, 0)?;
            Ok(match s.find(needle) {
                Some(byte_idx) => len_to_value(s[..byte_idx].chars().count()),
                None => Value::int(-1),
            })
        }
        "int" => {
            require_args(pos, method, 0, &args)?;
            s.trim()
                .parse::<i64>()
                .map(Value::int)
                .map_err(|_| conversion_error(pos, &receiver.inspect(), "INTEGER").into())
        }
        _ => {
            require_args(pos, method, 0, &args)?;
            s.trim()
                .parse::<f64>()
                .map(Value::float)
                .map_err(|_| conversion_error(pos, &receiver.inspect(), "FLOAT").into())
        }
    }
}
