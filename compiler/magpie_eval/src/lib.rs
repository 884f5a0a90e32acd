//! Magpie Eval - tree-walking evaluator for the Magpie scripting language.
//!
//! The crate consumes an already-parsed [`magpie_ir::Program`] and executes
//! it against a lexically scoped environment, producing a [`Value`] for
//! every node.
//!
//! # Architecture
//!
//! - [`Value`]: closed tagged union of runtime values (`value/`)
//! - [`Scope`], `CallFrame`, `CallStack`: lexical scopes and activations
//! - [`Interpreter`]: the recursive dispatch over statements and expressions
//! - [`ControlAction`]: `return`, `break`, `continue` and errors, carried on
//!   the `Err` side of [`EvalResult`]
//! - `methods`, `builtins`, `operators`: built-in behavior of each value kind
//! - [`GlobalRegistry`] and [`HostObject`]: the seam for host collaborators
//!   (the `sync` primitives ship with the engine)
//! - [`ModuleCache`] and [`ModuleLoader`]: `include` support
//!
//! # Example
//!
//! ```
//! use magpie_eval::{Interpreter, Value};
//! use magpie_ir::ast::build::*;
//! use magpie_ir::InfixOp;
//!
//! let program = program(vec![
//!     let_("x", int(40)),
//!     expr_stmt(infix(InfixOp::Add, ident("x"), int(2))),
//! ]);
//! let mut interp = Interpreter::new();
//! assert_eq!(interp.run(&program).ok(), Some(Value::int(42)));
//! ```

pub mod builtins;
mod environment;
pub mod errors;
mod eval_mode;
pub mod interpreter;
pub mod methods;
mod module_cache;
pub mod operators;
mod print_handler;
mod registry;
mod stack;
pub mod suggest;
pub mod sync;
mod value;

use std::sync::Once;

pub use environment::{CallFrame, CallStack, DeferredCall, Scope};
pub use errors::{ControlAction, EvalError, EvalErrorKind, EvalResult};
pub use eval_mode::{EvalMode, InternalFaultPolicy};
pub use interpreter::{Interpreter, InterpreterBuilder, ScopedInterpreter};
pub use module_cache::{module_name, MemoryLoader, ModuleCache, ModuleLoader};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};
pub use registry::GlobalRegistry;
pub use stack::ensure_sufficient_stack;
pub use value::{
    BoolValue, Builtin, BuiltinFn, CallContext, ChannelValue, EnumValue, FunctionValue, HashKey,
    HashPair, HashValue, HostObject, KeyTag, ModuleValue, Nullable, RangeValue, SendOnClosed,
    Shared, StructValue, TupleValue, Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=magpie_eval=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
