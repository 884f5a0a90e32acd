//! Prefix and infix operator semantics.
//!
//! The value kinds are a closed set, so dispatch is a priority-ordered
//! `match` on the operand kinds rather than a trait per type:
//!
//! 1. invalid (NULL) operands: only `==`/`!=` are defined
//! 2. `in` membership
//! 3. numeric ∘ numeric, with int/float promotion
//! 4. either side an array
//! 5. string ∘ string
//! 6. either side a string (`+`/`*` coercion)
//! 7. hash ∘ hash
//! 8. generic `==`/`!=`
//!
//! Anything left over is an `InfixOpError`. `&&`/`||` normally
//! short-circuit in the interpreter and only reach this module through
//! host calls.

use std::cmp::Ordering;

use magpie_ir::{InfixOp, Position, PrefixOp};
use regex::Regex;

use crate::errors::{
    divide_by_zero, infix_op_error, integer_overflow, prefix_op_error, regex_error,
    shift_range_error, ControlAction, EvalResult,
};
use crate::value::HashValue;
use crate::Value;

/// Evaluate `left op right`.
pub fn evaluate_infix(op: InfixOp, left: &Value, right: &Value, pos: Position) -> EvalResult {
    match op {
        InfixOp::And => return Ok(Value::boolean(left.is_truthy() && right.is_truthy())),
        InfixOp::Or => return Ok(Value::boolean(left.is_truthy() || right.is_truthy())),
        _ => {}
    }

    if !left.is_valid() || !right.is_valid() {
        return eval_invalid(op, left, right, pos);
    }

    if op == InfixOp::In {
        return eval_membership(left, right, pos);
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => return eval_int(op, *a.raw(), *b.raw(), pos),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
                return eval_float(op, a, b, left, right, pos);
            }
        }
        _ => {}
    }

    if matches!(left, Value::Array(_)) || matches!(right, Value::Array(_)) {
        return eval_array(op, left, right, pos);
    }

    if let (Some(a), Some(b)) = (left.as_str(), right.as_str()) {
        return eval_string(op, a, b, left, right, pos);
    }

    if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
        if let Some(result) = eval_string_coercion(op, left, right, pos) {
            return result;
        }
    }

    if let (Value::Hash(a), Value::Hash(b)) = (left, right) {
        return match op {
            InfixOp::Eq => Ok(Value::boolean(hashes_equal(&a.read(), &b.read()))),
            InfixOp::NotEq => Ok(Value::boolean(!hashes_equal(&a.read(), &b.read()))),
            InfixOp::Add => {
                let mut merged = a.snapshot();
                for pair in b.read().iter() {
                    if let Some(key) = pair.key.hash_key() {
                        merged.insert(key, pair.key.clone(), pair.value.clone());
                    }
                }
                Ok(Value::hash(merged))
            }
            _ => Err(mismatch(op, left, right, pos)),
        };
    }

    match op {
        InfixOp::Eq => Ok(Value::boolean(generic_equal(left, right, pos))),
        InfixOp::NotEq => Ok(Value::boolean(!generic_equal(left, right, pos))),
        _ => Err(mismatch(op, left, right, pos)),
    }
}

/// `left == right` under the language's rules; an operator error counts as
/// "not equal".
pub fn values_equal(left: &Value, right: &Value, pos: Position) -> bool {
    evaluate_infix(InfixOp::Eq, left, right, pos).is_ok_and(|v| v.is_truthy())
}

/// Evaluate `op operand`.
pub fn evaluate_prefix(op: PrefixOp, operand: &Value, pos: Position) -> EvalResult {
    if op == PrefixOp::Not {
        return Ok(Value::boolean(!operand.is_truthy()));
    }
    let fail = || -> ControlAction { prefix_op_error(pos, op.as_symbol(), operand.kind()).into() };
    match (op, operand) {
        (PrefixOp::Neg, Value::Int(n)) => match n.get() {
            Some(n) => n
                .checked_neg()
                .map(Value::int)
                .ok_or_else(|| integer_overflow(pos, "negation").into()),
            None => Err(fail()),
        },
        (PrefixOp::Neg, Value::Float(x)) => x.get().map(|x| Value::float(-x)).ok_or_else(fail),
        (PrefixOp::Plus, Value::Int(_) | Value::Float(_)) if operand.is_valid() => {
            Ok(operand.clone())
        }
        (PrefixOp::BitNot, Value::Int(n)) => n.get().map(|n| Value::int(!n)).ok_or_else(fail),
        _ => Err(fail()),
    }
}

/// Ordering used by `sort`: numbers numerically, strings lexically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.get()?.cmp(y.get()?)),
        _ => {
            if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
                return x.partial_cmp(&y);
            }
            Some(a.as_str()?.cmp(b.as_str()?))
        }
    }
}

#[cold]
fn mismatch(op: InfixOp, left: &Value, right: &Value, pos: Position) -> ControlAction {
    infix_op_error(pos, left.kind(), op.as_symbol(), right.kind()).into()
}

fn eval_invalid(op: InfixOp, left: &Value, right: &Value, pos: Position) -> EvalResult {
    let equal = left.is_nil()
        || right.is_nil()
        || (!left.is_valid() && !right.is_valid() && left.kind() == right.kind());
    match op {
        InfixOp::Eq => Ok(Value::boolean(equal)),
        InfixOp::NotEq => Ok(Value::boolean(!equal)),
        _ => Err(mismatch(op, left, right, pos)),
    }
}

fn eval_membership(needle: &Value, haystack: &Value, pos: Position) -> EvalResult {
    let found = match haystack {
        Value::Array(items) => items.read().iter().any(|item| values_equal(needle, item, pos)),
        Value::Tuple(t) => t.items.iter().any(|item| values_equal(needle, item, pos)),
        Value::Hash(h) => needle.hash_key().is_some_and(|k| h.read().contains_key(&k)),
        Value::Range(r) => needle.as_int().is_some_and(|n| r.contains(n)),
        Value::Str(s) => match needle.as_str() {
            Some(sub) => s.raw().contains(sub),
            None => return Err(mismatch(InfixOp::In, needle, haystack, pos)),
        },
        _ => return Err(mismatch(InfixOp::In, needle, haystack, pos)),
    };
    Ok(Value::boolean(found))
}

fn checked(result: Option<i64>, operation: &'static str, pos: Position) -> EvalResult {
    result
        .map(Value::int)
        .ok_or_else(|| integer_overflow(pos, operation).into())
}

#[expect(
    clippy::cast_precision_loss,
    reason = "numeric promotion to float is the language semantics"
)]
fn eval_int(op: InfixOp, a: i64, b: i64, pos: Position) -> EvalResult {
    match op {
        InfixOp::Add => checked(a.checked_add(b), "addition", pos),
        InfixOp::Sub => checked(a.checked_sub(b), "subtraction", pos),
        InfixOp::Mul => checked(a.checked_mul(b), "multiplication", pos),
        InfixOp::Div if b == 0 => Err(divide_by_zero(pos).into()),
        InfixOp::Div => Ok(Value::float(a as f64 / b as f64)),
        InfixOp::Mod if b == 0 => Err(divide_by_zero(pos).into()),
        InfixOp::Mod => checked(a.checked_rem(b), "remainder", pos),
        InfixOp::Pow => match u32::try_from(b) {
            Ok(exp) => checked(a.checked_pow(exp), "exponentiation", pos),
            Err(_) if b < 0 => Ok(Value::float((a as f64).powf(b as f64))),
            Err(_) => Err(integer_overflow(pos, "exponentiation").into()),
        },
        InfixOp::Eq => Ok(Value::boolean(a == b)),
        InfixOp::NotEq => Ok(Value::boolean(a != b)),
        InfixOp::Lt => Ok(Value::boolean(a < b)),
        InfixOp::LtEq => Ok(Value::boolean(a <= b)),
        InfixOp::Gt => Ok(Value::boolean(a > b)),
        InfixOp::GtEq => Ok(Value::boolean(a >= b)),
        InfixOp::BitAnd => Ok(Value::int(a & b)),
        InfixOp::BitOr => Ok(Value::int(a | b)),
        InfixOp::BitXor => Ok(Value::int(a ^ b)),
        InfixOp::Shl | InfixOp::Shr => {
            let amount = u32::try_from(b)
                .ok()
                .filter(|n| *n < 64)
                .ok_or_else(|| shift_range_error(pos, b))?;
            let shifted = if op == InfixOp::Shl {
                a.wrapping_shl(amount)
            } else {
                a >> amount
            };
            Ok(Value::int(shifted))
        }
        InfixOp::And | InfixOp::Or | InfixOp::Match | InfixOp::NotMatch | InfixOp::In => Err(
            infix_op_error(pos, "INTEGER", op.as_symbol(), "INTEGER").into(),
        ),
    }
}

#[expect(clippy::float_cmp, reason = "language equality on floats is exact")]
fn eval_float(
    op: InfixOp,
    a: f64,
    b: f64,
    left: &Value,
    right: &Value,
    pos: Position,
) -> EvalResult {
    match op {
        InfixOp::Add => Ok(Value::float(a + b)),
        InfixOp::Sub => Ok(Value::float(a - b)),
        InfixOp::Mul => Ok(Value::float(a * b)),
        InfixOp::Div | InfixOp::Mod if b == 0.0 => Err(divide_by_zero(pos).into()),
        InfixOp::Div => Ok(Value::float(a / b)),
        InfixOp::Mod => Ok(Value::float(a % b)),
        InfixOp::Pow => Ok(Value::float(a.powf(b))),
        InfixOp::Eq => Ok(Value::boolean(a == b)),
        InfixOp::NotEq => Ok(Value::boolean(a != b)),
        InfixOp::Lt => Ok(Value::boolean(a < b)),
        InfixOp::LtEq => Ok(Value::boolean(a <= b)),
        InfixOp::Gt => Ok(Value::boolean(a > b)),
        InfixOp::GtEq => Ok(Value::boolean(a >= b)),
        _ => Err(mismatch(op, left, right, pos)),
    }
}

fn repeat_count(n: &Value) -> Option<usize> {
    n.as_int().map(|n| usize::try_from(n).unwrap_or(0))
}

fn eval_array(op: InfixOp, left: &Value, right: &Value, pos: Position) -> EvalResult {
    match (op, left, right) {
        (InfixOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut items = a.snapshot();
            items.extend(b.read().iter().cloned());
            Ok(Value::array(items))
        }
        (InfixOp::Add, Value::Array(a), other) => {
            let mut items = a.snapshot();
            items.push(other.clone());
            Ok(Value::array(items))
        }
        (InfixOp::Add, other, Value::Array(b)) => {
            let mut items = Vec::with_capacity(b.read().len() + 1);
            items.push(other.clone());
            items.extend(b.read().iter().cloned());
            Ok(Value::array(items))
        }
        (InfixOp::Mul, Value::Array(a), n) | (InfixOp::Mul, n, Value::Array(a)) => {
            match repeat_count(n) {
                Some(count) => {
                    let items = a.read();
                    let mut out = Vec::with_capacity(items.len().saturating_mul(count));
                    for _ in 0..count {
                        out.extend(items.iter().cloned());
                    }
                    Ok(Value::array(out))
                }
                None => Err(mismatch(op, left, right, pos)),
            }
        }
        (InfixOp::Eq, _, _) => Ok(Value::boolean(arrays_equal(left, right, pos))),
        (InfixOp::NotEq, _, _) => Ok(Value::boolean(!arrays_equal(left, right, pos))),
        _ => Err(mismatch(op, left, right, pos)),
    }
}

fn arrays_equal(left: &Value, right: &Value, pos: Position) -> bool {
    let (Value::Array(a), Value::Array(b)) = (left, right) else {
        return false;
    };
    if a.ptr_eq(b) {
        return true;
    }
    // Snapshot so comparing an array nested in itself cannot deadlock.
    let (a, b) = (a.snapshot(), b.snapshot());
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| values_equal(x, y, pos))
}

fn hashes_equal(a: &HashValue, b: &HashValue) -> bool {
    a.len() == b.len()
        && a.iter().all(|pair| {
            pair.key.hash_key().and_then(|k| b.get(&k)).is_some_and(|other| {
                other.key.display() == pair.key.display()
                    && other.value.display() == pair.value.display()
            })
        })
}

fn compile(pattern: &str, pos: Position) -> EvalResult<Regex> {
    Regex::new(pattern).map_err(|e| regex_error(pos, pattern, &e).into())
}

fn eval_string(
    op: InfixOp,
    a: &str,
    b: &str,
    left: &Value,
    right: &Value,
    pos: Position,
) -> EvalResult {
    match op {
        InfixOp::Add => Ok(Value::string(format!("{a}{b}"))),
        InfixOp::Eq => Ok(Value::boolean(a == b)),
        InfixOp::NotEq => Ok(Value::boolean(a != b)),
        InfixOp::Lt => Ok(Value::boolean(a < b)),
        InfixOp::LtEq => Ok(Value::boolean(a <= b)),
        InfixOp::Gt => Ok(Value::boolean(a > b)),
        InfixOp::GtEq => Ok(Value::boolean(a >= b)),
        InfixOp::Match => Ok(Value::boolean(compile(b, pos)?.is_match(a))),
        InfixOp::NotMatch => Ok(Value::boolean(!compile(b, pos)?.is_match(a))),
        _ => Err(mismatch(op, left, right, pos)),
    }
}

/// `None` means "not a coercion case", letting dispatch fall through.
fn eval_string_coercion(
    op: InfixOp,
    left: &Value,
    right: &Value,
    pos: Position,
) -> Option<EvalResult> {
    match op {
        InfixOp::Add => Some(Ok(Value::string(format!(
            "{}{}",
            left.display(),
            right.display()
        )))),
        InfixOp::Mul => {
            let (s, n) = match (left.as_str(), right.as_str()) {
                (Some(s), None) => (s, right),
                (None, Some(s)) => (s, left),
                _ => return Some(Err(mismatch(op, left, right, pos))),
            };
            Some(
                repeat_count(n)
                    .map(|count| Value::string(s.repeat(count)))
                    .ok_or_else(|| mismatch(op, left, right, pos)),
            )
        }
        _ if left.as_number().is_some() || right.as_number().is_some() => {
            Some(Err(mismatch(op, left, right, pos)))
        }
        _ => None,
    }
}

fn generic_equal(left: &Value, right: &Value, pos: Position) -> bool {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.value == b.value,
        (Value::Nil(_), Value::Nil(_)) => true,
        (Value::Tuple(a), Value::Tuple(b)) => {
            a.items.len() == b.items.len()
                && a.items.iter().zip(b.items.iter()).all(|(x, y)| values_equal(x, y, pos))
        }
        (Value::Range(a), Value::Range(b)) => a == b,
        (Value::Bool(_) | Value::Nil(_) | Value::Tuple(_) | Value::Range(_), _) => false,
        // Remaining kinds are objects: identity.
        _ => left == right,
    }
}
