//! Member access, indexing and slicing.

use magpie_ir::{Expr, ExprKind, Position};

use super::Interpreter;
use crate::environment::Scope;
use crate::errors::{
    index_error, index_type_error, key_error, slice_error, unhashable_key, unknown_member,
    EvalResult,
};
use crate::methods::{method_names, resolve_index, slice_bounds};
use crate::suggest::suggest_similar;
use crate::value::HashKey;
use crate::Value;

impl Interpreter {
    /// `object.name`
    pub(super) fn eval_member(&mut self, object: &Expr, name: &str, pos: Position) -> EvalResult {
        if let ExprKind::Ident(base) = &object.kind {
            if let Some(value) = self.registry.get_member(base, name) {
                return Ok(value);
            }
        }
        let target = self.eval_expr(object)?;
        member_of(&target, name, pos)
    }

    /// `object[index]`
    pub(super) fn eval_index(&mut self, object: &Expr, index: &Expr, pos: Position) -> EvalResult {
        let target = self.eval_expr(object)?;
        let index = self.eval_expr(index)?;
        index_of(&target, &index, pos)
    }

    /// `object[start:end]`, either bound optional; negative bounds count
    /// from the end.
    pub(super) fn eval_slice(
        &mut self,
        object: &Expr,
        start: Option<&Expr>,
        end: Option<&Expr>,
        pos: Position,
    ) -> EvalResult {
        let target = self.eval_expr(object)?;
        let start = self.eval_bound(&target, start, pos)?.unwrap_or(0);
        let end = self.eval_bound(&target, end, pos)?;

        match &target {
            Value::Array(items) => {
                let items = items.read();
                let (lo, hi) = bounds(start, end, items.len(), pos)?;
                Ok(Value::array(items[lo..hi].to_vec()))
            }
            Value::Tuple(t) => {
                let (lo, hi) = bounds(start, end, t.items.len(), pos)?;
                Ok(Value::tuple(t.items[lo..hi].to_vec()))
            }
            Value::Str(s) if s.is_valid() => {
                let chars: Vec<char> = s.raw().chars().collect();
                let (lo, hi) = bounds(start, end, chars.len(), pos)?;
                Ok(Value::string(chars[lo..hi].iter().collect::<String>()))
            }
            other => Err(index_type_error(pos, other.kind(), "a slice").into()),
        }
    }

    fn eval_bound(&mut self, target: &Value, bound: Option<&Expr>, pos: Position) -> EvalResult<Option<i64>> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        let value = self.eval_expr(expr)?;
        match value.as_int() {
            Some(n) => Ok(Some(n)),
            None => Err(index_type_error(pos, target.kind(), value.kind()).into()),
        }
    }
}

fn bounds(start: i64, end: Option<i64>, len: usize, pos: Position) -> EvalResult<(usize, usize)> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let end = end.unwrap_or(len_i);
    slice_bounds(start, end, len).ok_or_else(|| slice_error(pos, start, end, len).into())
}

/// Read `name` from a scope-backed value.
fn scoped_member(scope: &Scope, kind: &str, name: &str, pos: Position) -> EvalResult {
    scope.get_local(name).ok_or_else(|| {
        let names = scope.local_bindings();
        let suggestion = suggest_similar(name, names.iter().map(|(n, _)| &**n));
        unknown_member(pos, name, kind, suggestion).into()
    })
}

/// Member lookup shared by `obj.name` expressions and assignment targets.
pub(super) fn member_of(target: &Value, name: &str, pos: Position) -> EvalResult {
    match target {
        Value::Struct(s) => scoped_member(&s.scope, "STRUCT", name, pos),
        Value::Enum(e) => scoped_member(&e.scope, "ENUM", name, pos),
        Value::Module(m) => scoped_member(&m.scope, "MODULE", name, pos),
        Value::Hash(h) => h
            .read()
            .get(&HashKey::string(name))
            .map(|pair| pair.value.clone())
            .ok_or_else(|| key_error(pos, name).into()),
        other => {
            let suggestion = suggest_similar(name, method_names(other).into_iter());
            Err(unknown_member(pos, name, other.kind(), suggestion).into())
        }
    }
}

/// `target[index]` for every indexable kind.
pub(super) fn index_of(target: &Value, index: &Value, pos: Position) -> EvalResult {
    let position_in = |len: usize| -> EvalResult<usize> {
        let i = index
            .as_int()
            .ok_or_else(|| index_type_error(pos, target.kind(), index.kind()))?;
        resolve_index(i, len).ok_or_else(|| index_error(pos, i, len).into())
    };

    match target {
        Value::Array(items) => {
            let items = items.read();
            let i = position_in(items.len())?;
            Ok(items[i].clone())
        }
        Value::Tuple(t) => {
            let i = position_in(t.items.len())?;
            Ok(t.items[i].clone())
        }
        Value::Str(s) if s.is_valid() => {
            let chars: Vec<char> = s.raw().chars().collect();
            let i = position_in(chars.len())?;
            Ok(Value::string(chars[i].to_string()))
        }
        Value::Range(r) => {
            let i = position_in(r.len())?;
            let offset = i64::try_from(i).unwrap_or(i64::MAX);
            Ok(Value::int(r.start.saturating_add(offset)))
        }
        // Missing keys read as nil.
        Value::Hash(h) => {
            let key = index
                .hash_key()
                .ok_or_else(|| unhashable_key(pos, index.kind()))?;
            Ok(h.read().get(&key).map_or_else(Value::nil, |pair| pair.value.clone()))
        }
        Value::Struct(_) | Value::Enum(_) | Value::Module(_) => match index.as_str() {
            Some(name) => member_of(target, name, pos),
            None => Err(index_type_error(pos, target.kind(), index.kind()).into()),
        },
        other => Err(index_type_error(pos, other.kind(), index.kind()).into()),
    }
}
