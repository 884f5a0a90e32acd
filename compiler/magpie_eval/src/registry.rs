//! Process-wide registry of host-provided names.
//!
//! Host collaborators publish values under dotted names (`math.PI`,
//! `sync.WaitGroup`). The registry is consulted before the scope chain for
//! plain identifiers, and before ordinary method dispatch for
//! `base.member` calls whose receiver is a bare identifier.
//!
//! Handles are shared: registering through one clone is visible to every
//! interpreter holding another, including spawned tasks.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::value::{Builtin, BuiltinFn};
use crate::Value;

#[derive(Clone, Default)]
pub struct GlobalRegistry(Arc<RwLock<FxHashMap<Arc<str>, Value>>>);

impl GlobalRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the engine's own collaborators (`sync`) installed.
    pub fn standard() -> Self {
        let registry = Self::new();
        crate::sync::register(&registry);
        registry
    }

    /// Publish `value` under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<Arc<str>>, value: Value) {
        let name = name.into();
        tracing::trace!(name = %name, kind = value.kind(), "registry entry");
        self.0.write().insert(name, value);
    }

    /// Publish a native function under its own name.
    pub fn register_fn(&self, name: &'static str, func: BuiltinFn) {
        self.register(name, Value::Builtin(Builtin::new(name, func)));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).cloned()
    }

    /// Look up `base.member`.
    pub fn get_member(&self, base: &str, member: &str) -> Option<Value> {
        self.get(&format!("{base}.{member}"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.0.write().remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.0.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl fmt::Debug for GlobalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dotted_members() {
        let registry = GlobalRegistry::new();
        registry.register("math.PI", Value::float(std::f64::consts::PI));
        assert_eq!(
            registry.get_member("math", "PI"),
            Some(Value::float(std::f64::consts::PI))
        );
        assert_eq!(registry.get("math"), None);
    }

    #[test]
    fn clones_share_entries() {
        let registry = GlobalRegistry::new();
        let alias = registry.clone();
        alias.register("answer", Value::int(42));
        assert_eq!(registry.get("answer"), Some(Value::int(42)));
        assert_eq!(registry.remove("answer"), Some(Value::int(42)));
        assert!(alias.is_empty());
    }

    #[test]
    fn standard_registry_has_sync() {
        let registry = GlobalRegistry::standard();
        for name in ["sync.Cond", "sync.Mutex", "sync.Once", "sync.RWMutex", "sync.WaitGroup"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(&*registry.names()[0], "sync.Cond");
    }
}
