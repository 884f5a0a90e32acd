//! Seams for host collaborators.
//!
//! Standard-library wrapper objects (files, sockets, sync primitives) are
//! [`HostObject`]s stored in `Value::Host`. They see the evaluator only
//! through [`CallContext`], which lets them call back into script functions
//! and report errors at the current source position.

use std::any::Any;
use std::fmt;

use magpie_ir::Position;

use super::hash::HashKey;
use super::Value;
use crate::errors::EvalResult;
use crate::print_handler::PrintHandler;

/// What a native function or host method can ask of the running evaluator.
pub trait CallContext {
    /// Invoke a callable value (function or builtin) with positional arguments.
    fn call(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult;

    /// Position of the call currently being evaluated, for error stamping.
    fn position(&self) -> Position;

    /// Output destination of the running program.
    fn output(&self) -> &PrintHandler;
}

/// A value implemented by the host rather than the core engine.
///
/// Once registered in the global registry, a host object behaves like any
/// built-in value: it has a kind, a display form and string-keyed methods.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Upper-case kind name reported by `type()`.
    fn kind(&self) -> &str;

    fn display(&self) -> String {
        format!("<{}>", self.kind())
    }

    /// Dispatch a method by name.
    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>)
        -> EvalResult;

    /// Method names, used for did-you-mean suggestions.
    fn methods(&self) -> &[&'static str] {
        &[]
    }

    /// Key to use when this object is a hash key; `None` if unhashable.
    fn hash_key(&self) -> Option<HashKey> {
        None
    }

    /// Elements produced by `for x in obj`; `None` if not iterable.
    fn iterate(&self) -> Option<Vec<Value>> {
        None
    }

    /// Raw output sink for writable objects (`fprintf`). Returns `None` when
    /// the object is not writable, or the host's error message on failure.
    fn write_str(&self, _text: &str) -> Option<Result<(), String>> {
        None
    }

    /// Downcasting hook for collaborators that cooperate with each other.
    fn as_any(&self) -> &dyn Any;
}
