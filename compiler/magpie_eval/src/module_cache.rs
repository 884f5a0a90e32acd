//! Process-wide cache of included modules.
//!
//! `include("path")` evaluates a unit at most once per process. Includes are
//! serialized by a re-entrant lock so that a module may itself include other
//! modules while its own evaluation is still in progress on the same thread;
//! other threads' includes block until the outermost one finishes. Lookups
//! only read the finished modules and never wait on that lock.
//!
//! Loading source is the host's job. The engine only sees parsed programs,
//! obtained through [`ModuleLoader`].

use std::cell::RefCell;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use magpie_ir::{Position, Program};
use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{include_error, EvalResult};
use crate::value::ModuleValue;
use crate::Value;

/// Host hook that turns an include path into a parsed program.
pub trait ModuleLoader: Send + Sync {
    /// Load and parse `path`. The error string is reported verbatim.
    fn load(&self, path: &str) -> Result<Program, String>;
}

/// Loader backed by programs registered up front. Hosts that parse ahead of
/// time (and tests) use this instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    programs: RwLock<FxHashMap<String, Program>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, path: impl Into<String>, program: Program) -> Self {
        self.insert(path, program);
        self
    }

    pub fn insert(&self, path: impl Into<String>, program: Program) {
        self.programs.write().insert(path.into(), program);
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Program, String> {
        self.programs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such module: {path}"))
    }
}

#[derive(Default)]
struct ModuleTable {
    modules: FxHashMap<Arc<str>, Arc<ModuleValue>>,
    /// Paths in the order they finished loading; lookup searches this order.
    order: Vec<Arc<str>>,
}

/// Cache of evaluated include units, keyed by path.
///
/// Two locks: `includes` serializes `include` calls and tracks the paths on
/// the current include chain; `finished` holds completed modules and is only
/// taken briefly. Identifier lookup touches `finished` alone, so tasks
/// spawned by a unit still being evaluated never wait on the include lock.
#[derive(Default)]
pub struct ModuleCache {
    includes: ReentrantMutex<RefCell<FxHashSet<Arc<str>>>>,
    finished: RwLock<ModuleTable>,
}

/// Takes a path off the include chain when its evaluation ends, including
/// by unwinding.
struct LoadingEntry<'a> {
    loading: &'a RefCell<FxHashSet<Arc<str>>>,
    path: Arc<str>,
}

impl Drop for LoadingEntry<'_> {
    fn drop(&mut self) {
        self.loading.borrow_mut().remove(&self.path);
    }
}

static GLOBAL_CACHE: OnceLock<Arc<ModuleCache>> = OnceLock::new();

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every interpreter that is not given
    /// its own.
    pub fn global() -> Arc<ModuleCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(ModuleCache::new())))
    }

    /// Return the cached module for `path`, or run `evaluate` to produce it.
    ///
    /// `evaluate` runs with the include lock held, so other threads'
    /// includes wait for it. A path that is still being evaluated further up
    /// the same include chain is an `IncludeError`.
    pub fn include(
        &self,
        path: &str,
        pos: Position,
        evaluate: impl FnOnce(&str) -> EvalResult<Arc<ModuleValue>>,
    ) -> EvalResult {
        let guard = self.includes.lock();
        if let Some(module) = self.cached(path) {
            tracing::debug!(path, "include cache hit");
            return Ok(Value::Module(module));
        }
        if guard.borrow().contains(path) {
            return Err(include_error(pos, path, "cyclic include").into());
        }

        tracing::debug!(path, "include cache miss");
        let key: Arc<str> = Arc::from(path);
        guard.borrow_mut().insert(Arc::clone(&key));
        let entry = LoadingEntry {
            loading: &*guard,
            path: Arc::clone(&key),
        };
        let result = evaluate(path);
        drop(entry);
        let module = result?;

        let mut table = self.finished.write();
        table.modules.insert(Arc::clone(&key), Arc::clone(&module));
        table.order.push(key);
        Ok(Value::Module(module))
    }

    fn cached(&self, path: &str) -> Option<Arc<ModuleValue>> {
        self.finished.read().modules.get(path).map(Arc::clone)
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.cached(path).map(Value::Module)
    }

    /// Finished modules in load order.
    fn loaded(&self) -> Vec<Arc<ModuleValue>> {
        let table = self.finished.read();
        table
            .order
            .iter()
            .filter_map(|p| table.modules.get(p).map(Arc::clone))
            .collect()
    }

    /// Resolve an identifier against included modules: a module's own name
    /// first, then the top-level bindings of each module in load order.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let modules = self.loaded();
        if let Some(module) = modules.iter().find(|m| &*m.name == name) {
            return Some(Value::Module(Arc::clone(module)));
        }
        modules.iter().find_map(|m| m.scope.get_local(name))
    }

    /// Names visible through [`lookup`](Self::lookup), for suggestions.
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names = Vec::new();
        for module in self.loaded() {
            names.push(Arc::clone(&module.name));
            names.extend(module.scope.local_bindings().into_iter().map(|(n, _)| n));
        }
        names
    }

    pub fn len(&self) -> usize {
        self.finished.read().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every cached module.
    pub fn clear(&self) {
        let mut table = self.finished.write();
        table.modules.clear();
        table.order.clear();
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.finished.read();
        f.debug_struct("ModuleCache")
            .field("modules", &table.order)
            .finish_non_exhaustive()
    }
}

/// The name a module is reachable under: the file stem of its path.
pub fn module_name(path: &str) -> Arc<str> {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .into()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
