//! Methods on HASH values.

use super::helpers::{len_to_value, no_such_method, require_args, require_args_between, require_callable_arg};
use crate::errors::{unhashable_key, EvalResult};
use crate::value::{CallContext, HashKey, HashValue, Shared};
use crate::Value;

pub const HASH_METHODS: &[&str] = &[
    "delete", "empty", "filter", "get", "has", "keys", "len", "map", "pop", "push", "set",
    "toString", "values",
];

pub fn dispatch_hash_method(
    ctx: &mut dyn CallContext,
    receiver: &Value,
    hash: &Shared<HashValue>,
    method: &str,
    args: Vec<Value>,
) -> EvalResult {
    let pos = ctx.position();
    let key_of = |v: &Value| -> EvalResult<HashKey> {
        v.hash_key().ok_or_else(|| unhashable_key(pos, v.kind()).into())
    };

    match method {
        "len" => {
            require_args(pos, method, 0, &args)?;
            Ok(len_to_value(hash.read().len()))
        }
        "empty" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::boolean(hash.read().is_empty()))
        }
        "keys" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::array(hash.read().keys()))
        }
        "values" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::array(hash.read().values()))
        }
        "toString" => {
            require_args(pos, method, 0, &args)?;
            Ok(Value::string(receiver.display()))
        }
        "push" | "set" => {
            require_args(pos, method, 2, &args)?;
            let mut args = args.into_iter();
            if let (Some(key), Some(value)) = (args.next(), args.next()) {
                let k = key_of(&key)?;
                hash.write().insert(k, key, value);
            }
            Ok(receiver.clone())
        }
        "pop" | "delete" => {
            require_args(pos, method, 1, &args)?;
            let k = key_of(&args[0])?;
            Ok(hash
                .write()
                .remove(&k)
                .map_or_else(Value::nil, |pair| pair.value))
        }
        "get" => {
            require_args_between(pos, method, 1, 2, &args)?;
            let k = key_of(&args[0])?;
            let found = hash.read().get(&k).map(|pair| pair.value.clone());
            Ok(found
                .or_else(|| args.get(1).cloned())
                .unwrap_or_else(Value::nil))
        }
        "has" => {
            require_args(pos, method, 1, &args)?;
            let k = key_of(&args[0])?;
            Ok(Value::boolean(hash.read().contains_key(&k)))
        }
        "filter" => {
            require_args(pos, method, 1, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            let pairs: Vec<_> = hash.read().iter().cloned().collect();
            let mut out = HashValue::new();
            for pair in pairs {
                let keep = ctx
                    .call(f, vec![pair.key.clone(), pair.value.clone()])?
                    .is_truthy();
                if keep {
                    let k = key_of(&pair.key)?;
                    out.insert(k, pair.key, pair.value);
                }
            }
            Ok(Value::hash(out))
        }
        "map" => {
            require_args(pos, method, 1, &args)?;
            let f = require_callable_arg(pos, method, &args, 0)?;
            let pairs: Vec<_> = hash.read().iter().cloned().collect();
            let mut out = Vec::with_capacity(pairs.len());
            for pair in pairs {
                out.push(ctx.call(f, vec![pair.key, pair.value])?);
            }
            Ok(Value::array(out))
        }
        _ => Err(no_such_method(pos, method, "HASH", HASH_METHODS).into()),
    }
}
