//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use super::Interpreter;
use crate::environment::{CallStack, Scope};
use crate::eval_mode::{EvalMode, InternalFaultPolicy};
use crate::module_cache::{ModuleCache, ModuleLoader};
use crate::print_handler::SharedPrintHandler;
use crate::registry::GlobalRegistry;
use crate::Value;

/// Builder for creating Interpreter instances with various configurations.
///
/// The default is `EvalMode::Interpret` with the standard registry (the
/// `sync` primitives), the process-wide module cache and no module loader:
/// - `EvalMode::Interpret` for running a script for the host
/// - `EvalMode::TestRun` for test harnesses (captured output, bounded depth)
pub struct InterpreterBuilder {
    mode: EvalMode,
    print_handler: Option<SharedPrintHandler>,
    registry: Option<GlobalRegistry>,
    modules: Option<Arc<ModuleCache>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    fault_policy: InternalFaultPolicy,
    args: Vec<String>,
}

impl InterpreterBuilder {
    /// Create a new builder with default `Interpret` mode.
    pub fn new() -> Self {
        Self {
            mode: EvalMode::default(),
            print_handler: None,
            registry: None,
            modules: None,
            loader: None,
            fault_policy: InternalFaultPolicy::default(),
            args: Vec::new(),
        }
    }

    /// Set the evaluation mode.
    ///
    /// Controls the default output destination and the recursion limit.
    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the print handler. Overrides the mode-based default.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Use `registry` instead of a fresh standard registry.
    #[must_use]
    pub fn registry(mut self, registry: GlobalRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a private module cache instead of the process-wide one.
    #[must_use]
    pub fn module_cache(mut self, modules: Arc<ModuleCache>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Set the loader consulted by `include`.
    #[must_use]
    pub fn module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Decide what callers observe when evaluation panics.
    #[must_use]
    pub fn fault_policy(mut self, policy: InternalFaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Script arguments, exposed to programs as `$args`.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// A root scope with `$args` bound, for passing to `eval_program`.
    pub fn root_scope(&self) -> Scope {
        let scope = Scope::root();
        let args = self.args.iter().map(|a| Value::string(a.as_str())).collect();
        scope.set("$args", Value::array(args));
        scope
    }

    /// Build the interpreter. Its initial scope is [`root_scope`](Self::root_scope).
    pub fn build(self) -> Interpreter {
        let env = self.root_scope();
        Interpreter {
            env,
            mode: self.mode,
            print_handler: self
                .print_handler
                .unwrap_or_else(|| self.mode.default_print_handler()),
            registry: self.registry.unwrap_or_else(GlobalRegistry::standard),
            modules: self.modules.unwrap_or_else(ModuleCache::global),
            loader: self.loader,
            fault_policy: self.fault_policy,
            call_stack: CallStack::new(self.mode.max_recursion_depth()),
            pos: magpie_ir::Position::UNKNOWN,
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
