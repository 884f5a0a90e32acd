//! Function call evaluation methods for the Interpreter.

use std::sync::Arc;

use magpie_ir::{Expr, ExprKind, Position};

use super::Interpreter;
use crate::environment::{CallFrame, DeferredCall};
use crate::errors::{argument_count, not_callable, ControlAction, EvalResult};
use crate::methods::len_to_value;
use crate::value::FunctionValue;
use crate::Value;

impl Interpreter {
    /// Evaluate `callee(args)`.
    ///
    /// A bare name resolves like any identifier (scope, then the builtin
    /// table); any other callee expression is evaluated and must produce a
    /// callable value.
    pub(super) fn eval_call(&mut self, callee: &Expr, args: &[Expr], pos: Position) -> EvalResult {
        let func = match &callee.kind {
            ExprKind::Ident(name) => self.lookup(name, pos)?,
            _ => self.eval_expr(callee)?,
        };
        let args = self.eval_exprs(args)?;
        self.call_value(&func, args, pos)
    }

    /// Invoke a callable value with already-evaluated arguments.
    pub fn call_value(&mut self, func: &Value, args: Vec<Value>, pos: Position) -> EvalResult {
        match func {
            Value::Function(f) => self.call_function(f, args, pos),
            Value::Builtin(b) => {
                if pos.is_known() {
                    self.pos = pos;
                }
                b.call(self, args)
            }
            other => Err(not_callable(pos, other.kind()).into()),
        }
    }

    /// The invocation protocol for script functions.
    ///
    /// The body runs in a fresh activation scope whose parent is the
    /// captured scope. Deferred calls registered on the frame run in
    /// registration order on every exit path, before the frame is popped.
    #[tracing::instrument(level = "debug", skip_all, fields(function = func.name()))]
    pub(crate) fn call_function(
        &mut self,
        func: &Arc<FunctionValue>,
        args: Vec<Value>,
        pos: Position,
    ) -> EvalResult {
        check_arg_count(func, args.len(), pos)?;

        let frame = Arc::new(CallFrame::new(func.name(), pos));
        self.call_stack.push(Arc::clone(&frame))?;
        tracing::trace!(depth = self.call_stack.depth(), "frame pushed");

        let activation = func.scope.activation(Arc::clone(&frame));
        let result = self.with_scope(activation, |interp| {
            let result = interp
                .bind_parameters(func, args)
                .and_then(|()| interp.eval_block(&func.lit.body));
            let result = match result {
                Err(ControlAction::Return(value)) => Ok(value),
                Err(ControlAction::Break | ControlAction::Continue) => Ok(Value::nil()),
                other => other,
            };
            interp.run_deferred(&frame);
            result
        });

        self.call_stack.pop();
        tracing::trace!(depth = self.call_stack.depth(), "frame popped");
        result
    }

    /// Bind positional parameters, defaults, the variadic rest array and
    /// `$argc` into the current (activation) scope.
    fn bind_parameters(&mut self, func: &FunctionValue, args: Vec<Value>) -> EvalResult<()> {
        let lit = &func.lit;
        let supplied = args.len();
        let fixed = fixed_params(func);
        let mut args = args.into_iter();

        for param in &lit.params[..fixed] {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                // Defaults see the parameters bound before them.
                (None, Some(default)) => self.eval_expr(default)?,
                (None, None) => Value::nil(),
            };
            self.env.set(Arc::clone(&param.name.name), value);
        }
        if lit.variadic {
            if let Some(rest) = lit.params.last() {
                self.env
                    .set(Arc::clone(&rest.name.name), Value::array(args.collect()));
            }
        }
        self.env.set("$argc", len_to_value(supplied));
        Ok(())
    }

    /// Drain and run the frame's deferred calls. Calls deferred while
    /// draining run too. Their failures are logged, never propagated.
    fn run_deferred(&mut self, frame: &CallFrame) {
        loop {
            let deferred = frame.take_deferred();
            if deferred.is_empty() {
                return;
            }
            tracing::debug!(function = frame.name(), count = deferred.len(), "running deferred calls");
            for DeferredCall { call, scope } in deferred {
                let result = self.with_scope(scope, |interp| interp.eval_expr(&call));
                if let Err(ControlAction::Error(err)) = result {
                    tracing::warn!(function = frame.name(), error = %err, "deferred call failed");
                }
            }
        }
    }
}

/// Declared parameters other than the variadic rest.
fn fixed_params(func: &FunctionValue) -> usize {
    if func.lit.variadic {
        func.lit.params.len().saturating_sub(1)
    } else {
        func.lit.params.len()
    }
}

fn check_arg_count(func: &FunctionValue, supplied: usize, pos: Position) -> EvalResult<()> {
    let required = func.lit.required_params();
    let fixed = fixed_params(func);
    let too_many = !func.lit.variadic && supplied > fixed;
    if supplied >= required && !too_many {
        return Ok(());
    }
    let expected = if func.lit.variadic {
        format!("at least {required}")
    } else if required == fixed {
        required.to_string()
    } else {
        format!("{required} to {fixed}")
    };
    Err(argument_count(pos, func.name(), expected, supplied).into())
}
