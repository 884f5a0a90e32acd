//! Runtime values.
//!
//! `Value` is a closed tagged union. Scalars are inline; containers and
//! objects are reference-counted, so cloning a `Value` never deep-copies and
//! arrays, hashes and struct scopes are shared by every holder.
//!
//! Non-local control (`return`, `break`, `continue`, errors) is not a value;
//! it travels on the `Err` side of `EvalResult` and can never end up stored
//! in a container.
//!
//! # Construction
//!
//! Use the factory methods (`Value::int`, `Value::string`, `Value::array`,
//! ...) rather than building variants by hand.

mod channel;
mod composite;
mod hash;
mod heap;
mod host;

use std::fmt;
use std::sync::Arc;

use magpie_ir::FunctionLit;

pub use channel::{ChannelValue, SendOnClosed};
pub use composite::{
    BoolValue, Builtin, BuiltinFn, EnumValue, FunctionValue, ModuleValue, Nullable, RangeValue,
    StructValue, TupleValue,
};
pub use hash::{fnv1a, HashKey, HashPair, HashValue, KeyTag};
pub use heap::Shared;
pub use host::{CallContext, HostObject};

use crate::environment::Scope;
use crate::errors::EvalResult;

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(Nullable<i64>),
    Float(Nullable<f64>),
    Bool(BoolValue),
    /// `nil`, optionally carrying a failure message.
    Nil(Option<Arc<str>>),
    Str(Nullable<Arc<str>>),
    Array(Shared<Vec<Value>>),
    Tuple(TupleValue),
    Hash(Shared<HashValue>),
    Struct(Arc<StructValue>),
    Enum(Arc<EnumValue>),
    Function(Arc<FunctionValue>),
    Builtin(Builtin),
    Range(RangeValue),
    Channel(ChannelValue),
    Module(Arc<ModuleValue>),
    Host(Arc<dyn HostObject>),
}

// Factory methods

impl Value {
    #[inline]
    pub const fn int(n: i64) -> Self {
        Value::Int(Nullable::valid(n))
    }

    #[inline]
    pub const fn float(x: f64) -> Self {
        Value::Float(Nullable::valid(x))
    }

    #[inline]
    pub const fn boolean(b: bool) -> Self {
        Value::Bool(BoolValue::new(b))
    }

    #[inline]
    pub const fn nil() -> Self {
        Value::Nil(None)
    }

    /// `nil` carrying a failure reason.
    pub fn nil_with(message: impl Into<Arc<str>>) -> Self {
        Value::Nil(Some(message.into()))
    }

    /// `false` carrying a failure reason.
    pub fn failure(message: impl Into<Arc<str>>) -> Self {
        Value::Bool(BoolValue {
            value: false,
            valid: true,
            message: Some(message.into()),
        })
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(Nullable::valid(s.into()))
    }

    pub const fn null_int() -> Self {
        Value::Int(Nullable::null(0))
    }

    pub const fn null_float() -> Self {
        Value::Float(Nullable::null(0.0))
    }

    pub fn null_string() -> Self {
        Value::Str(Nullable::null(Arc::from("")))
    }

    pub const fn null_bool() -> Self {
        Value::Bool(BoolValue {
            value: false,
            valid: false,
            message: None,
        })
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    pub fn hash(hash: HashValue) -> Self {
        Value::Hash(Shared::new(hash))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(TupleValue {
            items: items.into(),
            is_multi: false,
        })
    }

    /// Tuple produced by `return a, b`.
    pub fn multi(items: Vec<Value>) -> Self {
        Value::Tuple(TupleValue {
            items: items.into(),
            is_multi: true,
        })
    }

    pub const fn range(start: i64, end: i64) -> Self {
        Value::Range(RangeValue::new(start, end))
    }

    pub fn function(lit: Arc<FunctionLit>, scope: Scope) -> Self {
        Value::Function(Arc::new(FunctionValue::new(lit, scope)))
    }

    pub fn channel(capacity: usize) -> Self {
        Value::Channel(ChannelValue::new(capacity))
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Arc::new(object))
    }
}

// Inspection

impl Value {
    /// Kind name reported by `type()` and used in error messages.
    pub fn kind(&self) -> &str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOLEAN",
            Value::Nil(_) => "NIL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Tuple(_) => "TUPLE",
            Value::Hash(_) => "HASH",
            Value::Struct(_) => "STRUCT",
            Value::Enum(_) => "ENUM",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Range(_) => "RANGE",
            Value::Channel(_) => "CHANNEL",
            Value::Module(_) => "MODULE",
            Value::Host(h) => h.kind(),
        }
    }

    /// `false` only for NULL scalars.
    pub fn is_valid(&self) -> bool {
        match self {
            Value::Int(n) => n.is_valid(),
            Value::Float(x) => x.is_valid(),
            Value::Str(s) => s.is_valid(),
            Value::Bool(b) => b.valid,
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    pub fn is_truthy(&self) -> bool {
        if !self.is_valid() {
            return false;
        }
        match self {
            Value::Int(n) => *n.raw() != 0,
            Value::Float(x) => *x.raw() != 0.0,
            Value::Bool(b) => b.value,
            Value::Nil(_) => false,
            Value::Str(s) => !s.raw().is_empty(),
            Value::Array(items) => !items.read().is_empty(),
            Value::Tuple(t) => !t.items.is_empty(),
            Value::Hash(h) => !h.read().is_empty(),
            _ => true,
        }
    }

    /// Valid integer payload.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => n.get().copied(),
            _ => None,
        }
    }

    /// Valid numeric payload, promoting integers.
    #[expect(
        clippy::cast_precision_loss,
        reason = "numeric promotion to float is the language semantics"
    )]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => n.get().map(|n| *n as f64),
            Value::Float(x) => x.get().copied(),
            _ => None,
        }
    }

    /// Valid string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => s.get().map(|s| &**s),
            _ => None,
        }
    }

    /// Failure message of a catchable falsy value (`nil` or `false` with a
    /// non-empty message).
    pub fn failure_message(&self) -> Option<&str> {
        let message = match self {
            Value::Nil(Some(m)) => m,
            Value::Bool(BoolValue {
                value: false,
                message: Some(m),
                ..
            }) => m,
            _ => return None,
        };
        (!message.is_empty()).then_some(&**message)
    }

    /// Key used when this value indexes a hash; `None` if unhashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(n) => n.get().map(|n| HashKey::int(*n)),
            Value::Float(x) => x.get().map(|x| HashKey::float(*x)),
            Value::Bool(b) if b.valid => Some(HashKey::boolean(b.value)),
            Value::Str(s) => s.get().map(|s| HashKey::string(s)),
            Value::Host(h) => h.hash_key(),
            _ => None,
        }
    }

    /// Rendering used by `print`, interpolation and `str()`.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Rendering used for container elements: strings are quoted.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = fmt::write(&mut out, format_args!("{}", Nested(self)));
        out
    }

    /// Dispatch a built-in method by name.
    pub fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        crate::methods::call_method(ctx, self, name, args)
    }
}

/// Display wrapper that quotes strings.
struct Nested<'a>(&'a Value);

impl fmt::Display for Nested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Str(s) if s.is_valid() => write!(f, "\"{}\"", s.raw()),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", Nested(item))?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "error: invalid {} (null)", self.kind());
        }
        match self {
            Value::Int(n) => write!(f, "{}", n.raw()),
            Value::Float(x) => write!(f, "{}", x.raw()),
            Value::Bool(b) => write!(f, "{}", b.value),
            Value::Nil(Some(message)) => f.write_str(message),
            Value::Nil(None) => f.write_str("nil"),
            Value::Str(s) => f.write_str(s.raw()),
            Value::Array(items) => write_seq(f, "[", items.read().iter(), "]"),
            Value::Tuple(t) => write_seq(f, "(", t.items.iter(), ")"),
            Value::Hash(h) => {
                f.write_str("{")?;
                for (i, pair) in h.read().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} : {}", Nested(&pair.key), Nested(&pair.value))?;
                }
                f.write_str("}")
            }
            Value::Struct(s) => {
                f.write_str("struct {")?;
                for (i, (name, value)) in s.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} : {}", Nested(value))?;
                }
                f.write_str("}")
            }
            Value::Enum(e) => {
                f.write_str("enum {")?;
                for (i, name) in e.variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match e.scope.get_local(name) {
                        Some(value) => write!(f, "{name} : {}", Nested(&value))?,
                        None => f.write_str(name)?,
                    }
                }
                f.write_str("}")
            }
            Value::Function(func) => {
                let params: Vec<&str> = func.lit.params.iter().map(|p| p.name.as_str()).collect();
                let rest = if func.is_variadic() { "..." } else { "" };
                write!(f, "fn {}({}{rest})", func.name(), params.join(", "))
            }
            Value::Builtin(b) => write!(f, "builtin {}", b.name),
            Value::Range(r) => write!(f, "{}..{}", r.start, r.end),
            Value::Channel(_) => f.write_str("channel"),
            Value::Module(m) => write!(f, "module {}", m.name),
            Value::Host(h) => f.write_str(&h.display()),
        }
    }
}

/// Structural equality for host code and tests.
///
/// Containers compare by content; objects, functions and channels by
/// identity. Script-level `==` lives in `operators` and follows the
/// language's own rules.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil(a), Value::Nil(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || *a.read() == *b.read(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a.ptr_eq(b) || *a.read() == *b.read(),
            (Value::Struct(a), Value::Struct(b)) => Arc::ptr_eq(a, b),
            (Value::Enum(a), Value::Enum(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Channel(a), Value::Channel(b)) => a.ptr_eq(b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
