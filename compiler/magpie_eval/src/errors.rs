//! Runtime errors and control-flow propagation.
//!
//! Every evaluation step returns an [`EvalResult`]. The `Err` side is a
//! [`ControlAction`]: either a real [`EvalError`] or one of the non-local
//! exits (`return`, `break`, `continue`) that composing constructs forward
//! with `?` until a function boundary or loop consumes them.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` is a closed set of categories, each with a fixed message
//! template. Factory functions (e.g. `divide_by_zero(pos)`) are the only way
//! engine code builds errors; they render the message once and stamp the
//! originating source position.

use magpie_ir::Position;
use thiserror::Error;

use crate::Value;

/// Result of evaluating one node.
pub type EvalResult<T = Value> = Result<T, ControlAction>;

/// Non-local exits carried out of nested evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlAction {
    /// `return` unwinding to the nearest function boundary.
    Return(Value),
    /// `break` unwinding to the nearest loop.
    Break,
    /// `continue` unwinding to the nearest loop.
    Continue,
    /// A runtime error (including user `throw`).
    Error(Box<EvalError>),
}

impl ControlAction {
    /// The carried error, if this is an error.
    pub fn as_error(&self) -> Option<&EvalError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Consume into the carried error, if this is an error.
    pub fn into_error(self) -> Option<EvalError> {
        match self {
            Self::Error(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<EvalError> for ControlAction {
    #[inline]
    fn from(err: EvalError) -> Self {
        ControlAction::Error(Box::new(err))
    }
}

/// Typed error category.
///
/// The `Display` impl is the message template; it never includes the line
/// prefix, which lives on [`EvalError`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
    // Operators
    #[error("unsupported operator for prefix expression: '{op}' on {kind}")]
    PrefixOpError { op: &'static str, kind: String },
    #[error("unsupported operator for infix expression: {left} {op} {right}")]
    InfixOpError {
        left: String,
        op: &'static str,
        right: String,
    },
    #[error("unsupported operator for postfix expression: '{op}' on {kind}")]
    PostfixOpError { op: &'static str, kind: String },
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: &'static str },
    #[error("divide by zero")]
    DivideByZero,
    #[error("shift amount {amount} out of range (0-63)")]
    ShiftRangeError { amount: i64 },

    // Resolution
    #[error("unknown identifier: '{name}' is not defined")]
    UnknownIdentifier { name: String },
    #[error("unknown identifier: '{name}' is not defined, did you mean '{suggestion}'?")]
    UnknownIdentifierSuggest { name: String, suggestion: String },
    #[error("no method '{method}' for {kind}")]
    NoMethodError { method: String, kind: String },
    #[error("no method '{method}' for {kind}, did you mean '{suggestion}'?")]
    NoMethodErrorSuggest {
        method: String,
        kind: String,
        suggestion: String,
    },
    #[error("{kind} has no member '{name}'")]
    UnknownMember { name: String, kind: String },
    #[error("{kind} has no member '{name}', did you mean '{suggestion}'?")]
    UnknownMemberSuggest {
        name: String,
        kind: String,
        suggestion: String,
    },
    #[error("{kind} value is not callable")]
    NotCallable { kind: String },

    // Containers
    #[error("index {index} out of range (length {len})")]
    IndexError { index: i64, len: usize },
    #[error("slice [{start}:{end}] out of range (length {len})")]
    SliceError { start: i64, end: i64, len: usize },
    #[error("key error: {key}")]
    KeyError { key: String },
    #[error("{kind} cannot be indexed by {index}")]
    IndexTypeError { kind: String, index: String },
    #[error("{kind} is not iterable")]
    NotIterable { kind: String },
    #[error("range bounds must be INTEGER, got {start} and {end}")]
    RangeTypeError { start: String, end: String },

    // Calls
    #[error("wrong number of arguments to '{name}': expected {expected}, got {got}")]
    ArgumentCountError {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("argument {position} to '{method}' must be {expected}, got {got}")]
    ParamTypeError {
        method: String,
        position: usize,
        expected: &'static str,
        got: String,
    },
    #[error("'{name}' does not accept {kind} input")]
    InputTypeError { name: String, kind: String },
    #[error("maximum recursion depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },

    // Control flow
    #[error("throw requires a STRING, got {kind}")]
    ThrowTypeError { kind: String },
    /// User `throw`; the message is the thrown string verbatim.
    #[error("{message}")]
    UnhandledThrow { message: String },
    #[error("defer is only allowed inside a function")]
    DeferOutsideFunctionError,
    #[error("defer requires a function or method call")]
    DeferTargetError,
    #[error("spawn requires a function or method call")]
    SpawnTargetError,
    #[error("the right side of '|>' must be a function or method call")]
    PipeTargetError,
    #[error("assertion failed: {message}")]
    AssertionFailed { message: String },

    // Bindings
    #[error("cannot assign to {target}")]
    AssignTargetError { target: &'static str },
    #[error("let binds {names} names but got {values} values")]
    LetCountError { names: usize, values: usize },
    #[error("enum member '{name}' cannot be reassigned")]
    EnumAssignError { name: String },

    // Patterns
    #[error("invalid regular expression '{pattern}': {message}")]
    RegexError { pattern: String, message: String },

    // Modules
    #[error("no module loader configured for include '{path}'")]
    NoModuleLoader { path: String },
    #[error("cannot include '{path}': {message}")]
    IncludeError { path: String, message: String },

    // Concurrency
    #[error("send on closed channel")]
    ChannelClosed,
    #[error("{kind}: unlock of unlocked lock")]
    UnlockError { kind: String },
    #[error("negative WaitGroup counter")]
    WaitGroupNegative,
    #[error("failed to spawn task: {message}")]
    SpawnFailed { message: String },

    // Conversion and formatting
    #[error("format error: {message}")]
    FormatError { message: String },
    #[error("cannot convert {value} to {target}")]
    ConversionError { value: String, target: &'static str },

    // Collaborators and faults
    #[error("{message}")]
    HostError { message: String },
    #[error("internal error: {message}")]
    InternalError { message: String },
}

/// A runtime error stamped with the position that produced it.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{}{}", .pos.prefix(), .message)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Rendered message without the line prefix. `catch` clauses compare
    /// against this string.
    pub message: String,
    pub pos: Position,
}

impl EvalError {
    fn at(kind: EvalErrorKind, pos: Position) -> Self {
        let message = kind.to_string();
        EvalError { kind, message, pos }
    }

    /// The `line N: ` prefix of this error (empty for unknown positions).
    pub fn line_prefix(&self) -> String {
        self.pos.prefix()
    }

    /// Whether this error came from a user `throw`.
    pub fn is_throw(&self) -> bool {
        matches!(self.kind, EvalErrorKind::UnhandledThrow { .. })
    }
}

// Operators

#[cold]
pub fn prefix_op_error(pos: Position, op: &'static str, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::PrefixOpError {
            op,
            kind: kind.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn infix_op_error(pos: Position, left: &str, op: &'static str, right: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::InfixOpError {
            left: left.to_string(),
            op,
            right: right.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn postfix_op_error(pos: Position, op: &'static str, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::PostfixOpError {
            op,
            kind: kind.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn integer_overflow(pos: Position, operation: &'static str) -> EvalError {
    EvalError::at(EvalErrorKind::IntegerOverflow { operation }, pos)
}

#[cold]
pub fn divide_by_zero(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::DivideByZero, pos)
}

#[cold]
pub fn shift_range_error(pos: Position, amount: i64) -> EvalError {
    EvalError::at(EvalErrorKind::ShiftRangeError { amount }, pos)
}

// Resolution

/// Unknown identifier, with a did-you-mean suggestion when one exists.
#[cold]
pub fn unknown_identifier(pos: Position, name: &str, suggestion: Option<&str>) -> EvalError {
    let kind = match suggestion {
        Some(s) => EvalErrorKind::UnknownIdentifierSuggest {
            name: name.to_string(),
            suggestion: s.to_string(),
        },
        None => EvalErrorKind::UnknownIdentifier {
            name: name.to_string(),
        },
    };
    EvalError::at(kind, pos)
}

/// Unknown method on a value kind, with a did-you-mean suggestion when one exists.
#[cold]
pub fn no_method(pos: Position, method: &str, kind: &str, suggestion: Option<&str>) -> EvalError {
    let kind = match suggestion {
        Some(s) => EvalErrorKind::NoMethodErrorSuggest {
            method: method.to_string(),
            kind: kind.to_string(),
            suggestion: s.to_string(),
        },
        None => EvalErrorKind::NoMethodError {
            method: method.to_string(),
            kind: kind.to_string(),
        },
    };
    EvalError::at(kind, pos)
}

#[cold]
pub fn unknown_member(pos: Position, name: &str, kind: &str, suggestion: Option<&str>) -> EvalError {
    let kind = match suggestion {
        Some(s) => EvalErrorKind::UnknownMemberSuggest {
            name: name.to_string(),
            kind: kind.to_string(),
            suggestion: s.to_string(),
        },
        None => EvalErrorKind::UnknownMember {
            name: name.to_string(),
            kind: kind.to_string(),
        },
    };
    EvalError::at(kind, pos)
}

#[cold]
pub fn not_callable(pos: Position, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::NotCallable {
            kind: kind.to_string(),
        },
        pos,
    )
}

// Containers

#[cold]
pub fn index_error(pos: Position, index: i64, len: usize) -> EvalError {
    EvalError::at(EvalErrorKind::IndexError { index, len }, pos)
}

#[cold]
pub fn slice_error(pos: Position, start: i64, end: i64, len: usize) -> EvalError {
    EvalError::at(EvalErrorKind::SliceError { start, end, len }, pos)
}

#[cold]
pub fn key_error(pos: Position, key: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::KeyError {
            key: key.to_string(),
        },
        pos,
    )
}

/// A key of a kind that cannot be hashed.
#[cold]
pub fn unhashable_key(pos: Position, kind: &str) -> EvalError {
    key_error(pos, &format!("unusable as hash key: {kind}"))
}

#[cold]
pub fn index_type_error(pos: Position, kind: &str, index: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::IndexTypeError {
            kind: kind.to_string(),
            index: index.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn not_iterable(pos: Position, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::NotIterable {
            kind: kind.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn range_type_error(pos: Position, start: &str, end: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::RangeTypeError {
            start: start.to_string(),
            end: end.to_string(),
        },
        pos,
    )
}

// Calls

/// Wrong argument count. `expected` is rendered as written (`2`, `at least 1`).
#[cold]
pub fn argument_count(pos: Position, name: &str, expected: impl ToString, got: usize) -> EvalError {
    EvalError::at(
        EvalErrorKind::ArgumentCountError {
            name: name.to_string(),
            expected: expected.to_string(),
            got,
        },
        pos,
    )
}

#[cold]
pub fn param_type(
    pos: Position,
    method: &str,
    position: usize,
    expected: &'static str,
    got: &str,
) -> EvalError {
    EvalError::at(
        EvalErrorKind::ParamTypeError {
            method: method.to_string(),
            position,
            expected,
            got: got.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn input_type(pos: Position, name: &str, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::InputTypeError {
            name: name.to_string(),
            kind: kind.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn stack_overflow(pos: Position, depth: usize) -> EvalError {
    EvalError::at(EvalErrorKind::StackOverflow { depth }, pos)
}

// Control flow

#[cold]
pub fn throw_type_error(pos: Position, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::ThrowTypeError {
            kind: kind.to_string(),
        },
        pos,
    )
}

/// The error produced by `throw "message"`.
pub fn unhandled_throw(pos: Position, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::UnhandledThrow {
            message: message.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn defer_outside_function(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::DeferOutsideFunctionError, pos)
}

#[cold]
pub fn defer_target_error(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::DeferTargetError, pos)
}

#[cold]
pub fn spawn_target_error(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::SpawnTargetError, pos)
}

#[cold]
pub fn pipe_target_error(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::PipeTargetError, pos)
}

#[cold]
pub fn assertion_failed(pos: Position, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::AssertionFailed {
            message: message.to_string(),
        },
        pos,
    )
}

// Bindings

#[cold]
pub fn assign_target_error(pos: Position, target: &'static str) -> EvalError {
    EvalError::at(EvalErrorKind::AssignTargetError { target }, pos)
}

#[cold]
pub fn let_count_error(pos: Position, names: usize, values: usize) -> EvalError {
    EvalError::at(EvalErrorKind::LetCountError { names, values }, pos)
}

#[cold]
pub fn enum_assign_error(pos: Position, name: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::EnumAssignError {
            name: name.to_string(),
        },
        pos,
    )
}

// Patterns

#[cold]
pub fn regex_error(pos: Position, pattern: &str, err: &regex::Error) -> EvalError {
    EvalError::at(
        EvalErrorKind::RegexError {
            pattern: pattern.to_string(),
            message: err.to_string(),
        },
        pos,
    )
}

// Modules

#[cold]
pub fn no_module_loader(pos: Position, path: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::NoModuleLoader {
            path: path.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn include_error(pos: Position, path: &str, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::IncludeError {
            path: path.to_string(),
            message: message.to_string(),
        },
        pos,
    )
}

// Concurrency

#[cold]
pub fn channel_closed(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::ChannelClosed, pos)
}

#[cold]
pub fn unlock_error(pos: Position, kind: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::UnlockError {
            kind: kind.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn wait_group_negative(pos: Position) -> EvalError {
    EvalError::at(EvalErrorKind::WaitGroupNegative, pos)
}

#[cold]
pub fn spawn_failed(pos: Position, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::SpawnFailed {
            message: message.to_string(),
        },
        pos,
    )
}

// Conversion and formatting

#[cold]
pub fn format_error(pos: Position, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::FormatError {
            message: message.to_string(),
        },
        pos,
    )
}

#[cold]
pub fn conversion_error(pos: Position, value: &str, target: &'static str) -> EvalError {
    EvalError::at(
        EvalErrorKind::ConversionError {
            value: value.to_string(),
            target,
        },
        pos,
    )
}

// Collaborators and faults

/// Error raised by a host collaborator with a free-form message.
#[cold]
pub fn host_error(pos: Position, message: impl Into<String>) -> EvalError {
    EvalError::at(
        EvalErrorKind::HostError {
            message: message.into(),
        },
        pos,
    )
}

#[cold]
pub fn internal_error(pos: Position, message: &str) -> EvalError {
    EvalError::at(
        EvalErrorKind::InternalError {
            message: message.to_string(),
        },
        pos,
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
