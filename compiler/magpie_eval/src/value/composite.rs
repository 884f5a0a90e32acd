//! Payload types for the non-trivial `Value` variants.

use std::fmt;
use std::sync::Arc;

use magpie_ir::FunctionLit;

use super::host::CallContext;
use super::Value;
use crate::environment::Scope;
use crate::errors::EvalResult;

/// A scalar that may be SQL-style NULL.
///
/// Invalid values keep a placeholder payload so `setValid(true)` can restore
/// them; the payload is never observable while invalid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nullable<T> {
    value: T,
    valid: bool,
}

impl<T> Nullable<T> {
    #[inline]
    pub const fn valid(value: T) -> Self {
        Nullable { value, valid: true }
    }

    #[inline]
    pub const fn null(placeholder: T) -> Self {
        Nullable {
            value: placeholder,
            valid: false,
        }
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// The payload, if valid.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }

    /// The payload regardless of validity.
    #[inline]
    pub fn raw(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }
}

/// A boolean that may be NULL or carry a failure reason.
///
/// `false` with a message is how fallible host operations report failure
/// without throwing; `try` treats it as catchable.
#[derive(Clone, Debug, PartialEq)]
pub struct BoolValue {
    pub value: bool,
    pub valid: bool,
    pub message: Option<Arc<str>>,
}

impl BoolValue {
    pub const fn new(value: bool) -> Self {
        BoolValue {
            value,
            valid: true,
            message: None,
        }
    }
}

/// Tuple payload. `is_multi` marks the tuple built by `return a, b`.
#[derive(Clone, Debug, PartialEq)]
pub struct TupleValue {
    pub items: Arc<[Value]>,
    pub is_multi: bool,
}

/// Inclusive integer range `start..end`. Empty when `start > end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
}

impl RangeValue {
    pub const fn new(start: i64, end: i64) -> Self {
        RangeValue { start, end }
    }

    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        usize::try_from(self.end.abs_diff(self.start)).map_or(usize::MAX, |n| n.saturating_add(1))
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, n: i64) -> bool {
        self.start <= n && n <= self.end
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> {
        self.start..=self.end
    }
}

/// Closure: a shared function literal plus the scope it was created in.
pub struct FunctionValue {
    pub lit: Arc<FunctionLit>,
    pub scope: Scope,
}

impl FunctionValue {
    pub fn new(lit: Arc<FunctionLit>, scope: Scope) -> Self {
        FunctionValue { lit, scope }
    }

    /// Declared name, or `fn` for anonymous literals.
    pub fn name(&self) -> &str {
        self.lit.name.as_deref().unwrap_or("fn")
    }

    pub fn is_variadic(&self) -> bool {
        self.lit.variadic
    }

    /// Number of declared parameters (the variadic rest counts as one).
    pub fn arity(&self) -> usize {
        self.lit.params.len()
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("variadic", &self.is_variadic())
            .finish_non_exhaustive()
    }
}

/// `struct { ... }` instance: its member scope and the names of its methods.
#[derive(Debug)]
pub struct StructValue {
    pub scope: Scope,
    pub methods: Vec<Arc<str>>,
}

impl StructValue {
    /// Non-method members, sorted by name.
    pub fn fields(&self) -> Vec<(Arc<str>, Value)> {
        let mut fields: Vec<_> = self
            .scope
            .local_bindings()
            .into_iter()
            .filter(|(name, _)| !self.methods.contains(name))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        fields
    }
}

/// `enum { ... }` value: members bound in `scope`, listed in declaration order.
#[derive(Debug)]
pub struct EnumValue {
    pub scope: Scope,
    pub variants: Vec<Arc<str>>,
}

/// An evaluated include unit.
#[derive(Debug)]
pub struct ModuleValue {
    /// File stem of `path`, the name the module is reachable under.
    pub name: Arc<str>,
    pub path: Arc<str>,
    pub scope: Scope,
}

/// Native function signature shared by the builtin table and host modules.
pub type BuiltinFn = fn(&mut dyn CallContext, Vec<Value>) -> EvalResult;

/// A native function value.
#[derive(Copy, Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, func: BuiltinFn) -> Self {
        Builtin { name, func }
    }

    pub fn call(&self, ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
        (self.func)(ctx, args)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}
