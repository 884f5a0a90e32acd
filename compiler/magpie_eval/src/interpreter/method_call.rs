//! Method call resolution.
//!
//! `receiver.method(args)` resolves in three steps:
//!
//! 1. a bare-identifier receiver naming a registry entry `receiver.method`
//!    (host collaborators such as `sync.WaitGroup`);
//! 2. a module, struct or enum receiver: a member of its scope, called when
//!    it is callable and returned otherwise;
//! 3. the built-in method table of the receiver's kind.
//!
//! Steps 2 and 3 both go through [`methods::call_method`]. An error while
//! evaluating the receiver propagates before any dispatch is attempted.

use magpie_ir::{Expr, ExprKind, Position};

use super::Interpreter;
use crate::errors::{not_callable, EvalResult};
use crate::{methods, Value};

impl Interpreter {
    pub(super) fn eval_method_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        pos: Position,
    ) -> EvalResult {
        if let ExprKind::Ident(base) = &receiver.kind {
            if let Some(member) = self.registry.get_member(base, method) {
                let args = self.eval_exprs(args)?;
                return self.call_registry_member(&member, args, pos);
            }
        }

        let target = self.eval_expr(receiver)?;
        let args = self.eval_exprs(args)?;
        if pos.is_known() {
            self.pos = pos;
        }
        methods::call_method(self, &target, method, args)
    }

    /// A registry member is called when callable; a constant is returned
    /// as-is when no arguments were supplied.
    fn call_registry_member(&mut self, member: &Value, args: Vec<Value>, pos: Position) -> EvalResult {
        if member.is_callable() {
            self.call_value(member, args, pos)
        } else if args.is_empty() {
            Ok(member.clone())
        } else {
            Err(not_callable(pos, member.kind()).into())
        }
    }
}
