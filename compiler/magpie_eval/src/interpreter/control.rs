//! Conditionals, `case`, `try`/`throw`, `defer`, `spawn`, pipe, `include`,
//! and struct/enum literals.

use std::sync::Arc;
use std::thread;

use magpie_ir::{
    Block, CaseExpr, CatchPattern, Expr, ExprKind, Ident, IfBranch, Position, TryExpr,
};
use regex::Regex;

use super::Interpreter;
use crate::environment::{DeferredCall, Scope};
use crate::errors::{
    defer_outside_function, defer_target_error, include_error, no_module_loader,
    pipe_target_error, regex_error, spawn_failed, spawn_target_error, throw_type_error,
    unhandled_throw, ControlAction, EvalResult,
};
use crate::module_cache::module_name;
use crate::operators::values_equal;
use crate::print_handler::silent_handler;
use crate::value::{EnumValue, ModuleValue, StructValue};
use crate::Value;

impl Interpreter {
    // Conditionals

    /// First truthy branch, else the `else` block, else nil.
    pub(super) fn eval_if(&mut self, branches: &[IfBranch], otherwise: Option<&Block>) -> EvalResult {
        for branch in branches {
            if self.eval_expr(&branch.cond)?.is_truthy() {
                return self.eval_block_scoped(&branch.body);
            }
        }
        match otherwise {
            Some(block) => self.eval_block_scoped(block),
            None => Ok(Value::nil()),
        }
    }

    pub(super) fn eval_unless(&mut self, cond: &Expr, body: &Block, otherwise: Option<&Block>) -> EvalResult {
        if !self.eval_expr(cond)?.is_truthy() {
            self.eval_block_scoped(body)
        } else if let Some(block) = otherwise {
            self.eval_block_scoped(block)
        } else {
            Ok(Value::nil())
        }
    }

    /// `case subject is { ... }` compares with `==`; `case subject in { ... }`
    /// treats each pattern's display string as a regex over the subject's.
    /// An unmatched case without `else` evaluates to the subject.
    pub(super) fn eval_case(&mut self, case: &CaseExpr, pos: Position) -> EvalResult {
        let subject = self.eval_expr(&case.subject)?;
        for arm in &case.arms {
            for pattern in &arm.patterns {
                let candidate = self.eval_expr(pattern)?;
                if self.case_matches(&subject, &candidate, case.whole_match, pos)? {
                    return self.eval_block_scoped(&arm.body);
                }
            }
        }
        match &case.otherwise {
            Some(block) => self.eval_block_scoped(block),
            None => Ok(subject),
        }
    }

    fn case_matches(&self, subject: &Value, candidate: &Value, whole_match: bool, pos: Position) -> EvalResult<bool> {
        if whole_match {
            return Ok(values_equal(subject, candidate, pos));
        }
        let pattern = candidate.display();
        let re = Regex::new(&pattern).map_err(|err| regex_error(pos, &pattern, &err))?;
        Ok(re.is_match(&subject.display()))
    }

    // Errors

    /// `try { } catch ... { } finally { }`.
    ///
    /// Catchable results are errors and nil/false values carrying a
    /// message. Inside a catch block `$_` holds the message.
    pub(super) fn eval_try(&mut self, try_expr: &TryExpr) -> EvalResult {
        let mut result = self.eval_block_scoped(&try_expr.body);

        if let Some(message) = catchable_message(&result) {
            for clause in &try_expr.catches {
                let Some(binding) = self.catch_binding(&clause.pattern, &message) else {
                    continue;
                };
                tracing::trace!(%message, "caught");
                result = self.with_child_scope(|interp| {
                    interp.env.set("$_", Value::string(message.as_str()));
                    if let Some(name) = binding {
                        interp.env.set(Arc::clone(&name.name), Value::string(message.as_str()));
                    }
                    interp.eval_block(&clause.body)
                });
                break;
            }
        }

        if let Some(finally) = &try_expr.finally {
            let cleanup = self.eval_block_scoped(finally);
            if let Err(err @ ControlAction::Error(_)) = cleanup {
                return Err(err);
            }
        }
        result
    }

    /// Whether `pattern` catches `message`. The inner option is the name to
    /// bind the message to.
    fn catch_binding<'p>(&self, pattern: &'p CatchPattern, message: &str) -> Option<Option<&'p Ident>> {
        match pattern {
            CatchPattern::Literal(text) => (&**text == message).then_some(None),
            CatchPattern::Ident(name) => match self.env.get(name.as_str()) {
                Some(bound) => (bound.as_str() == Some(message)).then_some(None),
                None => Some(Some(name)),
            },
            CatchPattern::Else => Some(None),
        }
    }

    /// `throw "message"`; anything but a string is a `ThrowTypeError`.
    pub(super) fn eval_throw(&mut self, value: &Expr, pos: Position) -> EvalResult {
        let value = self.eval_expr(value)?;
        match value.as_str() {
            Some(message) => Err(unhandled_throw(pos, message).into()),
            None => Err(throw_type_error(pos, value.kind()).into()),
        }
    }

    // Deferred and concurrent calls

    /// Register `call` on the enclosing function's frame. Its arguments are
    /// evaluated when the frame unwinds, in the scope captured here.
    pub(super) fn eval_defer(&mut self, call: &Arc<Expr>, pos: Position) -> EvalResult {
        if !call.is_call() {
            return Err(defer_target_error(pos).into());
        }
        let frame = self
            .env
            .current_frame()
            .ok_or_else(|| defer_outside_function(pos))?;
        tracing::trace!(function = frame.name(), "deferred call registered");
        frame.defer(DeferredCall {
            call: Arc::clone(call),
            scope: self.env.clone(),
        });
        Ok(Value::nil())
    }

    /// Run `call` on a new OS thread against a child of the current scope.
    /// The task's result is discarded; its errors are logged.
    pub(super) fn eval_spawn(&mut self, call: &Arc<Expr>, pos: Position) -> EvalResult {
        if !call.is_call() {
            return Err(spawn_target_error(pos).into());
        }
        let mut task = self.fork(self.env.child());
        let call = Arc::clone(call);
        thread::Builder::new()
            .name("magpie-task".to_string())
            .spawn(move || {
                let result = task.guarded(|interp| interp.eval_expr(&call));
                if let Err(ControlAction::Error(err)) = result {
                    tracing::warn!(error = %err, "spawned task failed");
                }
            })
            .map_err(|err| spawn_failed(pos, &err.to_string()))?;
        tracing::debug!(%pos, "task spawned");
        Ok(Value::nil())
    }

    // Pipe

    /// `value |> f(args)` evaluates `f(value, args)`. The left value is
    /// turned back into a literal node; values with no literal form pipe
    /// nothing and the whole expression is nil.
    pub(super) fn eval_pipe(&mut self, left: &Expr, right: &Expr, pos: Position) -> EvalResult {
        if !right.is_call() {
            return Err(pipe_target_error(pos).into());
        }
        let value = self.eval_expr(left)?;
        let Some(literal) = value_to_literal(&value, left.pos) else {
            return Ok(Value::nil());
        };

        let mut call = right.clone();
        match &mut call.kind {
            ExprKind::Call { args, .. } | ExprKind::MethodCall { args, .. } => args.insert(0, literal),
            _ => return Err(pipe_target_error(pos).into()),
        }
        self.eval_expr(&call)
    }

    // Modules

    /// `include "path"`: evaluate the unit once per cache, in its own root
    /// scope with output suppressed, and return the module value.
    pub(super) fn eval_include(&mut self, path: &Arc<str>, pos: Position) -> EvalResult {
        let Some(loader) = self.loader.clone() else {
            return Err(no_module_loader(pos, path).into());
        };
        let modules = Arc::clone(&self.modules);
        modules.include(path, pos, |path| {
            let program = loader
                .load(path)
                .map_err(|message| include_error(pos, path, &message))?;
            let scope = Scope::root();
            let mut unit = self.fork_with_output(scope.clone(), silent_handler());
            unit.eval_top_level(&program.statements)?;
            Ok(Arc::new(ModuleValue {
                name: module_name(path),
                path: Arc::from(path),
                scope,
            }))
        })
    }

    // Aggregates

    /// `struct { ... }`: the block's bindings become members; those holding
    /// functions are its methods.
    pub(super) fn eval_struct(&mut self, body: &Block) -> EvalResult {
        let scope = self.env.child();
        self.with_scope(scope.clone(), |interp| interp.eval_block(body))?;
        let methods = scope
            .local_bindings()
            .into_iter()
            .filter(|(_, value)| matches!(value, Value::Function(_)))
            .map(|(name, _)| name)
            .collect();
        Ok(Value::Struct(Arc::new(StructValue { scope, methods })))
    }

    /// `enum { A, B = 5, C }`: implicit values count up from 0, continuing
    /// after the last explicit integer.
    pub(super) fn eval_enum(&mut self, variants: &[(Ident, Option<Expr>)]) -> EvalResult {
        let scope = self.env.child();
        let mut next: i64 = 0;
        let mut names = Vec::with_capacity(variants.len());
        for (name, explicit) in variants {
            let value = match explicit {
                Some(expr) => self.eval_expr(expr)?,
                None => Value::int(next),
            };
            if let Some(n) = value.as_int() {
                next = n.saturating_add(1);
            }
            scope.set(Arc::clone(&name.name), value);
            names.push(Arc::clone(&name.name));
        }
        Ok(Value::Enum(Arc::new(EnumValue {
            scope,
            variants: names,
        })))
    }
}

/// The message of a catchable result, if it is one.
fn catchable_message(result: &EvalResult) -> Option<String> {
    match result {
        Err(ControlAction::Error(err)) => Some(err.message.clone()),
        Ok(value) => value.failure_message().map(str::to_string),
        Err(_) => None,
    }
}

/// The literal node for `value`, if it has one.
fn value_to_literal(value: &Value, pos: Position) -> Option<Expr> {
    let kind = match value {
        Value::Int(n) => ExprKind::Int(*n.get()?),
        Value::Float(x) => ExprKind::Float(*x.get()?),
        Value::Str(s) => ExprKind::Str(Arc::clone(s.get()?)),
        Value::Bool(b) if b.valid => ExprKind::Bool(b.value),
        Value::Nil(_) => ExprKind::Nil,
        Value::Array(items) => ExprKind::Array(
            items
                .read()
                .iter()
                .map(|item| value_to_literal(item, pos))
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Hash(h) => ExprKind::Hash(
            h.read()
                .iter()
                .map(|pair| Some((value_to_literal(&pair.key, pos)?, value_to_literal(&pair.value, pos)?)))
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    };
    Some(Expr::new(kind, pos))
}
