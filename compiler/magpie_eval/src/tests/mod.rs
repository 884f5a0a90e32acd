//! Language-level tests: whole programs built with `magpie_ir::ast::build`
//! and run through a test-mode interpreter with captured output.

mod aggregate_tests;
mod concurrency_tests;
mod eval_tests;
mod loop_tests;

use std::sync::Arc;

use magpie_ir::{Program, Stmt};

use crate::{EvalError, EvalMode, EvalResult, Interpreter, ModuleCache, Value};

/// Test-mode interpreter with a private module cache.
pub(crate) fn interpreter() -> Interpreter {
    Interpreter::builder()
        .mode(EvalMode::TestRun)
        .module_cache(Arc::new(ModuleCache::new()))
        .build()
}

pub(crate) fn eval(statements: Vec<Stmt>) -> EvalResult {
    interpreter().run(&Program::new(statements))
}

pub(crate) fn eval_ok(statements: Vec<Stmt>) -> Value {
    eval(statements).unwrap()
}

pub(crate) fn eval_err(statements: Vec<Stmt>) -> EvalError {
    eval(statements).unwrap_err().into_error().unwrap()
}

/// Result and captured output.
pub(crate) fn eval_output(statements: Vec<Stmt>) -> (EvalResult, String) {
    let mut interp = interpreter();
    let result = interp.run(&Program::new(statements));
    (result, interp.print_handler().output())
}

pub(crate) fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().copied().map(Value::int).collect())
}

pub(crate) fn strs(values: &[&str]) -> Value {
    Value::array(values.iter().map(|s| Value::string(*s)).collect())
}
