//! Tree-walking interpreter for Magpie.
//!
//! # Architecture
//!
//! Every node is evaluated by one recursive dispatch: [`Interpreter::eval_stmt`]
//! for statements and [`Interpreter::eval_expr`] for expressions. The current
//! lexical scope lives in `self.env` and is swapped with RAII guards
//! (`scope_guard.rs`) on block, loop-iteration and function entry.
//!
//! Non-local control travels on the `Err` side of [`EvalResult`] as a
//! [`ControlAction`], so every composing construct simply uses `?`:
//!
//! - function boundaries consume `Return` (`function_call.rs`)
//! - loops consume `Break` and `Continue` (`loops.rs`)
//! - `try` intercepts errors (`control.rs`)
//!
//! Helper modules:
//!
//! - `access.rs` - identifiers, member access, indexing, slicing
//! - `assign.rs` - `let`, assignment, `++`/`--`
//! - `function_call.rs` - call resolution and the invocation protocol
//! - `method_call.rs` - the three-step method resolution
//! - `loops.rs` - loops, comprehensions, `grep`, `map`
//! - `control.rs` - conditionals, `case`, `try`, `throw`, `defer`, `spawn`,
//!   pipe, `include`, struct and enum literals
//!
//! # Faults
//!
//! A panic escaping evaluation is intercepted at the program (and spawned
//! task) boundary, logged, and handled per [`InternalFaultPolicy`].

mod access;
mod assign;
mod builder;
mod control;
mod function_call;
mod loops;
mod method_call;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use magpie_ir::{Block, Expr, ExprKind, InfixOp, Position, Program, Stmt, StmtKind, StrPart};

use crate::environment::{CallStack, Scope};
use crate::errors::{
    internal_error, range_type_error, unhashable_key, unknown_identifier, ControlAction, EvalResult,
};
use crate::eval_mode::{EvalMode, InternalFaultPolicy};
use crate::module_cache::{ModuleCache, ModuleLoader};
use crate::operators::{evaluate_infix, evaluate_prefix};
use crate::print_handler::{PrintHandler, SharedPrintHandler};
use crate::registry::GlobalRegistry;
use crate::stack::ensure_sufficient_stack;
use crate::suggest::suggest_similar;
use crate::value::{CallContext, HashValue};
use crate::{builtins, Value};

/// Tree-walking interpreter.
///
/// One interpreter evaluates one task: the top-level program, an included
/// unit, or a spawned call. Interpreters created with [`fork`](Self::fork)
/// share the registry, module cache, loader and output but have their own
/// call stack.
pub struct Interpreter {
    /// Current lexical scope.
    pub(crate) env: Scope,
    pub(crate) mode: EvalMode,
    pub(crate) print_handler: SharedPrintHandler,
    pub(crate) registry: GlobalRegistry,
    pub(crate) modules: Arc<ModuleCache>,
    pub(crate) loader: Option<Arc<dyn ModuleLoader>>,
    pub(crate) fault_policy: InternalFaultPolicy,
    /// Live activations of this task; depth-limited per `mode`.
    pub(crate) call_stack: CallStack,
    /// Position of the node being evaluated, reported to builtins and host
    /// objects through [`CallContext::position`].
    pub(crate) pos: Position,
}

impl Interpreter {
    /// An interpreter with default configuration.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn registry(&self) -> &GlobalRegistry {
        &self.registry
    }

    pub fn modules(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Scope the interpreter is currently evaluating in.
    pub fn current_scope(&self) -> &Scope {
        &self.env
    }

    /// A new interpreter for another task or unit, evaluating in `scope`.
    pub fn fork(&self, scope: Scope) -> Interpreter {
        self.fork_with_output(scope, Arc::clone(&self.print_handler))
    }

    pub(crate) fn fork_with_output(&self, scope: Scope, output: SharedPrintHandler) -> Interpreter {
        Interpreter {
            env: scope,
            mode: self.mode,
            print_handler: output,
            registry: self.registry.clone(),
            modules: Arc::clone(&self.modules),
            loader: self.loader.clone(),
            fault_policy: self.fault_policy,
            call_stack: CallStack::new(self.mode.max_recursion_depth()),
            pos: self.pos,
        }
    }

    // Entry points

    /// Evaluate a whole program against `scope`.
    ///
    /// Statements run in order. The first error stops evaluation and is
    /// returned; a top-level `return` ends the program with its value; a
    /// stray `break`/`continue` ends it with `nil`. The result on success is
    /// the value of the last statement.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn eval_program(&mut self, program: &Program, scope: &Scope) -> EvalResult {
        let scope = scope.clone();
        self.guarded(|interp| {
            interp.with_scope(scope, |interp| interp.eval_top_level(&program.statements))
        })
    }

    /// Evaluate a program in the interpreter's own root scope (the one
    /// holding `$args`). Bindings persist across calls.
    pub fn run(&mut self, program: &Program) -> EvalResult {
        let scope = self.env.clone();
        self.eval_program(program, &scope)
    }

    /// Run `f`, intercepting any panic as an internal fault.
    pub(crate) fn guarded(&mut self, f: impl FnOnce(&mut Interpreter) -> EvalResult) -> EvalResult {
        match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    position = %self.pos,
                    backtrace = ?self.call_stack.backtrace(),
                    %message,
                    "internal fault during evaluation"
                );
                self.call_stack.clear();
                match self.fault_policy {
                    InternalFaultPolicy::Propagate => Err(internal_error(self.pos, &message).into()),
                    InternalFaultPolicy::Swallow => Ok(Value::nil()),
                }
            }
        }
    }

    /// Top-level statement loop shared by programs and included units.
    pub(crate) fn eval_top_level(&mut self, statements: &[Stmt]) -> EvalResult {
        let mut last = Value::nil();
        for stmt in statements {
            match self.eval_stmt(stmt) {
                Ok(value) => last = value,
                Err(ControlAction::Return(value)) => return Ok(value),
                Err(ControlAction::Break | ControlAction::Continue) => return Ok(Value::nil()),
                Err(err @ ControlAction::Error(_)) => return Err(err),
            }
        }
        Ok(last)
    }

    /// Evaluate a block's statements in the current scope.
    ///
    /// The value is that of the last statement, or `nil` for an empty block.
    pub fn eval_block(&mut self, block: &Block) -> EvalResult {
        let mut last = Value::nil();
        for stmt in &block.statements {
            last = self.eval_stmt(stmt)?;
        }
        Ok(last)
    }

    /// Evaluate a block in a fresh child scope.
    pub fn eval_block_scoped(&mut self, block: &Block) -> EvalResult {
        self.with_child_scope(|interp| interp.eval_block(block))
    }

    // Statements

    pub fn eval_stmt(&mut self, stmt: &Stmt) -> EvalResult {
        if stmt.pos.is_known() {
            self.pos = stmt.pos;
        }
        let pos = self.pos;
        match &stmt.kind {
            StmtKind::Let { names, values } => self.eval_let(names, values, pos),
            StmtKind::Return(values) => {
                let value = match values.as_slice() {
                    [] => Value::nil(),
                    [single] => self.eval_expr(single)?,
                    many => Value::multi(self.eval_exprs(many)?),
                };
                Err(ControlAction::Return(value))
            }
            StmtKind::Expr(expr) => self.eval_expr(expr),
            StmtKind::Function { name, func } => {
                let value = Value::function(Arc::clone(func), self.env.clone());
                self.env.set(Arc::clone(&name.name), value);
                Ok(Value::nil())
            }
            StmtKind::Defer(call) => self.eval_defer(call, pos),
            StmtKind::Spawn(call) => self.eval_spawn(call, pos),
            StmtKind::Throw(value) => self.eval_throw(value, pos),
            StmtKind::Break => Err(ControlAction::Break),
            StmtKind::Continue => Err(ControlAction::Continue),
            StmtKind::Block(block) => self.eval_block_scoped(block),
        }
    }

    // Expressions

    /// Evaluate an expression, growing the native stack when needed.
    #[inline]
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr))
    }

    /// Evaluate expressions left to right, stopping at the first failure.
    pub fn eval_exprs(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval_expr(e)).collect()
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        // Unpositioned nodes report the position of the enclosing one.
        if expr.pos.is_known() {
            self.pos = expr.pos;
        }
        let pos = self.pos;
        match &expr.kind {
            // Literals
            ExprKind::Ident(name) => self.lookup(name, pos),
            ExprKind::Int(n) => Ok(Value::int(*n)),
            ExprKind::Float(x) => Ok(Value::float(*x)),
            ExprKind::Str(s) => Ok(Value::string(Arc::clone(s))),
            ExprKind::Bool(b) => Ok(Value::boolean(*b)),
            ExprKind::Nil => Ok(Value::nil()),
            ExprKind::Interpolated(parts) => self.eval_interpolated(parts),
            ExprKind::Array(items) => Ok(Value::array(self.eval_exprs(items)?)),
            ExprKind::Hash(pairs) => self.eval_hash_literal(pairs),
            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_exprs(items)?)),
            ExprKind::Range { start, end } => {
                let start = self.eval_expr(start)?;
                let end = self.eval_expr(end)?;
                match (start.as_int(), end.as_int()) {
                    (Some(s), Some(e)) => Ok(Value::range(s, e)),
                    _ => Err(range_type_error(pos, start.kind(), end.kind()).into()),
                }
            }
            ExprKind::Function(lit) => Ok(Value::function(Arc::clone(lit), self.env.clone())),
            ExprKind::Struct(body) => self.eval_struct(body),
            ExprKind::Enum(variants) => self.eval_enum(variants),

            // Operators
            ExprKind::Prefix { op, operand } => {
                let value = self.eval_expr(operand)?;
                evaluate_prefix(*op, &value, pos)
            }
            ExprKind::Infix { op, left, right } => self.eval_infix(*op, left, right, pos),
            ExprKind::Postfix { op, target } => self.eval_postfix(*op, target, pos),
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value, pos),
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(otherwise)
                }
            }
            ExprKind::Pipe { left, right } => self.eval_pipe(left, right, pos),

            // Calls and access
            ExprKind::Call { callee, args } => self.eval_call(callee, args, pos),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.eval_method_call(receiver, method.as_str(), args, pos),
            ExprKind::Member { object, name } => self.eval_member(object, name.as_str(), pos),
            ExprKind::Index { object, index } => self.eval_index(object, index, pos),
            ExprKind::Slice { object, start, end } => {
                self.eval_slice(object, start.as_deref(), end.as_deref(), pos)
            }

            // Control
            ExprKind::If {
                branches,
                otherwise,
            } => self.eval_if(branches, otherwise.as_ref()),
            ExprKind::Unless {
                cond,
                body,
                otherwise,
            } => self.eval_unless(cond, body, otherwise.as_ref()),
            ExprKind::While { cond, body } => self.eval_while(cond, body),
            ExprKind::Do(body) | ExprKind::Forever(body) => self.eval_forever(body),
            ExprKind::For {
                init,
                cond,
                update,
                body,
            } => self.eval_for(init.as_deref(), cond.as_deref(), update.as_deref(), body),
            ExprKind::ForEach(each) => self.eval_for_each(each, pos),
            ExprKind::Comprehension(comp) => self.eval_comprehension(comp, pos),
            ExprKind::Grep {
                var,
                iterable,
                cond,
            } => self.eval_grep(var.as_str(), iterable, cond, pos),
            ExprKind::Map {
                var,
                iterable,
                body,
            } => self.eval_map(var.as_str(), iterable, body, pos),
            ExprKind::Case(case) => self.eval_case(case, pos),
            ExprKind::Try(try_expr) => self.eval_try(try_expr),
            ExprKind::Include(path) => self.eval_include(path, pos),
        }
    }

    fn eval_interpolated(&mut self, parts: &[StrPart]) -> EvalResult {
        let mut out = String::new();
        for part in parts {
            match part {
                StrPart::Lit(text) => out.push_str(text),
                StrPart::Expr(expr) => out.push_str(&self.eval_expr(expr)?.display()),
            }
        }
        Ok(Value::string(out))
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expr, Expr)]) -> EvalResult {
        let mut hash = HashValue::new();
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr)?;
            let hash_key = key
                .hash_key()
                .ok_or_else(|| unhashable_key(self.pos, key.kind()))?;
            let value = self.eval_expr(value_expr)?;
            hash.insert(hash_key, key, value);
        }
        Ok(Value::hash(hash))
    }

    /// `&&` and `||` short-circuit; everything else evaluates both sides
    /// left to right before dispatching on the operand kinds.
    fn eval_infix(&mut self, op: InfixOp, left: &Expr, right: &Expr, pos: Position) -> EvalResult {
        let left = self.eval_expr(left)?;
        match op {
            InfixOp::And if !left.is_truthy() => return Ok(Value::boolean(false)),
            InfixOp::Or if left.is_truthy() => return Ok(Value::boolean(true)),
            _ => {}
        }
        let right = self.eval_expr(right)?;
        evaluate_infix(op, &left, &right, pos)
    }

    // Identifiers

    /// Resolve a bare identifier: global registry, scope chain, included
    /// modules, then the builtin table.
    pub fn lookup(&self, name: &str, pos: Position) -> EvalResult {
        if let Some(value) = self.registry.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        if let Some(value) = self.modules.lookup(name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(self.unknown_identifier(name, pos))
    }

    /// `UnknownIdentifier` with a suggestion drawn from every name visible
    /// at this point.
    #[cold]
    pub(crate) fn unknown_identifier(&self, name: &str, pos: Position) -> ControlAction {
        let scope_names = self.env.names();
        let registry_names = self.registry.names();
        let module_names = self.modules.names();
        let mut candidates: Vec<&str> = scope_names
            .iter()
            .chain(&registry_names)
            .chain(&module_names)
            .map(|n| &**n)
            .collect();
        for builtin in builtins::names() {
            candidates.push(builtin);
        }
        unknown_identifier(pos, name, suggest_similar(name, candidates.into_iter())).into()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("mode", &self.mode)
            .field("fault_policy", &self.fault_policy)
            .field("depth", &self.call_stack.depth())
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

impl CallContext for Interpreter {
    fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        let pos = self.pos;
        self.call_value(callee, args, pos)
    }

    fn position(&self) -> Position {
        self.pos
    }

    fn output(&self) -> &PrintHandler {
        &self.print_handler
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
