//! RAII scope switching for the interpreter.
//!
//! The interpreter evaluates against `self.env`. Entering a block, loop
//! iteration or function body swaps in another scope through
//! [`ScopedInterpreter`], which restores the previous scope when dropped,
//! including while unwinding from a panic that the fault guard intercepts.

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::environment::Scope;

/// Guard holding the interpreter with a temporarily replaced scope.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    previous: Option<Scope>,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.interpreter.env = previous;
        }
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interpreter
    }
}

impl Interpreter {
    /// Switch to `scope` until the returned guard is dropped.
    pub fn scoped(&mut self, scope: Scope) -> ScopedInterpreter<'_> {
        let previous = std::mem::replace(&mut self.env, scope);
        ScopedInterpreter {
            interpreter: self,
            previous: Some(previous),
        }
    }

    /// Run `f` with `scope` as the current scope.
    #[inline]
    pub fn with_scope<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Interpreter) -> T) -> T {
        let mut scoped = self.scoped(scope);
        f(&mut scoped)
    }

    /// Run `f` in a fresh child of the current scope.
    #[inline]
    pub fn with_child_scope<T>(&mut self, f: impl FnOnce(&mut Interpreter) -> T) -> T {
        let child = self.env.child();
        self.with_scope(child, f)
    }
}
