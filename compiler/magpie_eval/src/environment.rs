//! Lexical scopes and call frames.
//!
//! A [`Scope`] is a handle to a parent-linked table of bindings. Handles are
//! shared, never copied: a closure keeps the scope it was created in, a
//! spawned task keeps a child of its spawner's scope, and a mutation through
//! any handle is visible through all of them.
//!
//! # Thread Safety
//!
//! Each scope node sits behind a `parking_lot::RwLock`, so a single `get`,
//! `set` or `reset` is atomic even when tasks share the scope. Sequences of
//! them are not: `x += 1` is a read followed by a write, and two tasks doing
//! it concurrently can lose an update. Scripts serialize such updates with
//! the `sync` primitives.
//!
//! # Call Frames
//!
//! Every function activation creates a scope tagged with a [`CallFrame`].
//! `defer` walks from the current (possibly nested block) scope to the
//! nearest tagged scope, so deferred calls always attach to the enclosing
//! function rather than to a lexical block. A per-task [`CallStack`] tracks
//! activation depth for the recursion limit.

use std::fmt;
use std::sync::Arc;

use magpie_ir::{Expr, Position};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::errors::{stack_overflow, EvalError};
use crate::Value;

struct ScopeData {
    bindings: FxHashMap<Arc<str>, Value>,
    parent: Option<Scope>,
    frame: Option<Arc<CallFrame>>,
}

/// Shared handle to one scope node.
#[derive(Clone)]
pub struct Scope(Arc<RwLock<ScopeData>>);

impl Scope {
    fn with(parent: Option<Scope>, frame: Option<Arc<CallFrame>>) -> Self {
        Scope(Arc::new(RwLock::new(ScopeData {
            bindings: FxHashMap::default(),
            parent,
            frame,
        })))
    }

    /// A scope with no parent.
    pub fn root() -> Self {
        Self::with(None, None)
    }

    pub fn new(parent: Option<&Scope>) -> Self {
        Self::with(parent.cloned(), None)
    }

    /// A block/iteration scope nested in this one.
    pub fn child(&self) -> Self {
        Self::with(Some(self.clone()), None)
    }

    /// The activation scope of a function call.
    pub fn activation(&self, frame: Arc<CallFrame>) -> Self {
        Self::with(Some(self.clone()), Some(frame))
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.read().parent.clone()
    }

    /// Look `name` up through the parent chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let data = current.0.read();
                if let Some(value) = data.bindings.get(name) {
                    return Some(value.clone());
                }
                data.parent.clone()
            };
            current = parent?;
        }
    }

    /// Look `name` up in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.0.read().bindings.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn set(&self, name: impl Into<Arc<str>>, value: Value) {
        self.0.write().bindings.insert(name.into(), value);
    }

    /// Overwrite the nearest existing binding of `name`.
    ///
    /// Returns the previous value, or `None` (binding nothing) when `name`
    /// is not bound anywhere in the chain.
    pub fn reset(&self, name: &str, value: Value) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut data = current.0.write();
                if let Some(slot) = data.bindings.get_mut(name) {
                    return Some(std::mem::replace(slot, value));
                }
                data.parent.clone()
            };
            current = parent?;
        }
    }

    /// Every name visible from this scope, innermost first, without duplicates.
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let data = scope.0.read();
            for name in data.bindings.keys() {
                if !names.contains(name) {
                    names.push(Arc::clone(name));
                }
            }
            current = data.parent.clone();
        }
        names
    }

    /// Bindings of this scope only, in no particular order.
    pub fn local_bindings(&self) -> Vec<(Arc<str>, Value)> {
        self.0
            .read()
            .bindings
            .iter()
            .map(|(k, v)| (Arc::clone(k), v.clone()))
            .collect()
    }

    /// The frame of the nearest enclosing function activation.
    pub fn current_frame(&self) -> Option<Arc<CallFrame>> {
        let mut current = self.clone();
        loop {
            let parent = {
                let data = current.0.read();
                if let Some(frame) = &data.frame {
                    return Some(Arc::clone(frame));
                }
                data.parent.clone()
            };
            current = parent?;
        }
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Scope {
    // Bindings may hold closures over this very scope; print the shape only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.read();
        f.debug_struct("Scope")
            .field("bindings", &data.bindings.len())
            .field("has_parent", &data.parent.is_some())
            .field("frame", &data.frame.as_ref().map(|fr| fr.name()))
            .finish()
    }
}

/// A call registered by `defer`, evaluated in the scope it was deferred from.
#[derive(Clone, Debug)]
pub struct DeferredCall {
    pub call: Arc<Expr>,
    pub scope: Scope,
}

/// Per-activation record.
#[derive(Debug)]
pub struct CallFrame {
    name: Arc<str>,
    call_site: Position,
    deferred: Mutex<Vec<DeferredCall>>,
}

impl CallFrame {
    pub fn new(name: impl Into<Arc<str>>, call_site: Position) -> Self {
        CallFrame {
            name: name.into(),
            call_site,
            deferred: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call_site(&self) -> Position {
        self.call_site
    }

    pub fn defer(&self, call: DeferredCall) {
        self.deferred.lock().push(call);
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.lock().len()
    }

    /// Remove and return the deferred calls in registration order.
    pub fn take_deferred(&self) -> Vec<DeferredCall> {
        std::mem::take(&mut *self.deferred.lock())
    }
}

/// Live activations of one task.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<Arc<CallFrame>>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` is `None` for unlimited depth.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing with `StackOverflow` past the depth limit.
    ///
    /// The frame is not pushed on failure.
    pub fn push(&mut self, frame: Arc<CallFrame>) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(stack_overflow(frame.call_site(), max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Arc<CallFrame>> {
        self.frames.pop()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&Arc<CallFrame>> {
        self.frames.last()
    }

    /// Drop every frame (after an intercepted fault).
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Function names, innermost first.
    pub fn backtrace(&self) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .map(|f| format!("{} (called at {})", f.name(), f.call_site()))
            .collect()
    }
}
