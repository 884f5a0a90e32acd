//! `let`, assignment and `++`/`--`.
//!
//! Assignment targets are resolved to a [`Place`] once, so `a[f()] += 1`
//! evaluates `a` and `f()` a single time for both the read and the write.

use std::sync::Arc;

use magpie_ir::{AssignOp, Expr, ExprKind, Ident, PostfixOp, Position};

use super::access::{index_of, member_of};
use super::Interpreter;
use crate::errors::{
    assign_target_error, enum_assign_error, index_error, index_type_error, integer_overflow,
    let_count_error, postfix_op_error, unhashable_key, unknown_member, EvalResult,
};
use crate::methods::resolve_index;
use crate::operators::evaluate_infix;
use crate::value::HashKey;
use crate::Value;

/// A resolved assignment target.
enum Place {
    Name(Arc<str>),
    Element { container: Value, index: Value },
    Member { object: Value, name: Arc<str> },
}

impl Interpreter {
    /// `let a, b = x, y` binds pairwise; `let a, b = pair` destructures a
    /// tuple or array of matching length. Always evaluates to nil.
    pub(super) fn eval_let(&mut self, names: &[Ident], values: &[Expr], pos: Position) -> EvalResult {
        if names.len() == values.len() {
            let evaluated = self.eval_exprs(values)?;
            for (name, value) in names.iter().zip(evaluated) {
                self.env.set(Arc::clone(&name.name), value);
            }
            return Ok(Value::nil());
        }

        let [single] = values else {
            return Err(let_count_error(pos, names.len(), values.len()).into());
        };
        let items = match self.eval_expr(single)? {
            Value::Tuple(t) => t.items.to_vec(),
            Value::Array(items) => items.snapshot(),
            _ => return Err(let_count_error(pos, names.len(), 1).into()),
        };
        if items.len() != names.len() {
            return Err(let_count_error(pos, names.len(), items.len()).into());
        }
        for (name, value) in names.iter().zip(items) {
            self.env.set(Arc::clone(&name.name), value);
        }
        Ok(Value::nil())
    }

    /// `target = value` and the compound forms. Evaluates to the stored value.
    ///
    /// Plain `=` on a name not bound anywhere declares it in the current
    /// scope; compound forms require an existing binding.
    pub(super) fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        pos: Position,
    ) -> EvalResult {
        let place = self.resolve_place(target, pos)?;
        let new_value = match op.infix() {
            None => self.eval_expr(value)?,
            Some(infix) => {
                let current = self.read_place(&place, pos)?;
                let rhs = self.eval_expr(value)?;
                evaluate_infix(infix, &current, &rhs, pos)?
            }
        };
        self.write_place(place, new_value.clone(), op == AssignOp::Assign, pos)?;
        Ok(new_value)
    }

    /// `x++` / `x--` on an integer or float target. Evaluates to the value
    /// before the update.
    pub(super) fn eval_postfix(&mut self, op: PostfixOp, target: &Expr, pos: Position) -> EvalResult {
        let place = self.resolve_place(target, pos)?;
        let old = self.read_place(&place, pos)?;
        let (step, float_step) = match op {
            PostfixOp::Increment => (1_i64, 1.0_f64),
            PostfixOp::Decrement => (-1, -1.0),
        };
        let new_value = match &old {
            Value::Int(n) if n.is_valid() => {
                let updated = n
                    .raw()
                    .checked_add(step)
                    .ok_or_else(|| integer_overflow(pos, op.as_symbol()))?;
                Value::int(updated)
            }
            Value::Float(x) if x.is_valid() => Value::float(x.raw() + float_step),
            other => return Err(postfix_op_error(pos, op.as_symbol(), other.kind()).into()),
        };
        self.write_place(place, new_value, false, pos)?;
        Ok(old)
    }

    fn resolve_place(&mut self, target: &Expr, pos: Position) -> EvalResult<Place> {
        match &target.kind {
            ExprKind::Ident(name) => Ok(Place::Name(Arc::clone(name))),
            ExprKind::Index { object, index } => {
                let container = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                Ok(Place::Element { container, index })
            }
            ExprKind::Member { object, name } => {
                let object = self.eval_expr(object)?;
                Ok(Place::Member {
                    object,
                    name: Arc::clone(&name.name),
                })
            }
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => {
                Err(assign_target_error(pos, "a call").into())
            }
            _ => Err(assign_target_error(pos, "this expression").into()),
        }
    }

    fn read_place(&self, place: &Place, pos: Position) -> EvalResult {
        match place {
            Place::Name(name) => self
                .env
                .get(name)
                .ok_or_else(|| self.unknown_identifier(name, pos)),
            Place::Element { container, index } => index_of(container, index, pos),
            Place::Member { object, name } => member_of(object, name, pos),
        }
    }

    fn write_place(&mut self, place: Place, value: Value, declare: bool, pos: Position) -> EvalResult<()> {
        match place {
            Place::Name(name) => {
                if self.env.reset(&name, value.clone()).is_none() {
                    if !declare {
                        return Err(self.unknown_identifier(&name, pos));
                    }
                    self.env.set(name, value);
                }
                Ok(())
            }
            Place::Element { container, index } => store_element(&container, &index, value, pos),
            Place::Member { object, name } => store_member(&object, &name, value, pos),
        }
    }
}

fn store_element(container: &Value, index: &Value, value: Value, pos: Position) -> EvalResult<()> {
    match container {
        Value::Array(items) => {
            let mut items = items.write();
            let len = items.len();
            let i = index
                .as_int()
                .ok_or_else(|| index_type_error(pos, container.kind(), index.kind()))?;
            let slot = resolve_index(i, len).ok_or_else(|| index_error(pos, i, len))?;
            items[slot] = value;
            Ok(())
        }
        Value::Hash(h) => {
            let key = index
                .hash_key()
                .ok_or_else(|| unhashable_key(pos, index.kind()))?;
            h.write().insert(key, index.clone(), value);
            Ok(())
        }
        Value::Struct(_) | Value::Enum(_) => match index.as_str() {
            Some(name) => store_member(container, name, value, pos),
            None => Err(index_type_error(pos, container.kind(), index.kind()).into()),
        },
        other => Err(index_type_error(pos, other.kind(), index.kind()).into()),
    }
}

fn store_member(object: &Value, name: &str, value: Value, pos: Position) -> EvalResult<()> {
    match object {
        // Only existing members; a miss must not fall through to the
        // enclosing scope.
        Value::Struct(s) => {
            if s.scope.get_local(name).is_none() {
                return Err(unknown_member(pos, name, object.kind(), None).into());
            }
            s.scope.set(name, value);
            Ok(())
        }
        Value::Enum(_) => Err(enum_assign_error(pos, name).into()),
        Value::Hash(h) => {
            h.write()
                .insert(HashKey::string(name), Value::string(name), value);
            Ok(())
        }
        _ => Err(assign_target_error(pos, "a member of this value").into()),
    }
}
