use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use pretty_assertions::assert_eq;

use super::*;
use crate::environment::Scope;
use crate::errors::{internal_error, ControlAction, EvalErrorKind};

fn module(path: &str, bindings: &[(&str, i64)]) -> Arc<ModuleValue> {
    let scope = Scope::root();
    for (name, value) in bindings {
        scope.set(*name, Value::int(*value));
    }
    Arc::new(ModuleValue {
        name: module_name(path),
        path: path.into(),
        scope,
    })
}

#[test]
fn module_names_are_file_stems() {
    assert_eq!(&*module_name("lib/util.mp"), "util");
    assert_eq!(&*module_name("plain"), "plain");
}

#[test]
fn second_include_is_a_cache_hit() {
    let cache = ModuleCache::new();
    let evaluations = Cell::new(0);
    let load = |path: &str| {
        evaluations.set(evaluations.get() + 1);
        Ok(module(path, &[("answer", 42)]))
    };
    let first = cache.include("util.mp", Position::UNKNOWN, load).unwrap();
    let second = cache
        .include("util.mp", Position::UNKNOWN, |_| panic!("must not reload"))
        .unwrap();
    assert_eq!(evaluations.get(), 1);
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
}

#[test]
fn failed_include_is_not_cached() {
    let cache = ModuleCache::new();
    let result = cache.include("bad.mp", Position::line(3), |_| {
        Err(internal_error(Position::line(3), "boom").into())
    });
    assert!(result.is_err());
    assert!(cache.is_empty());
    cache
        .include("bad.mp", Position::UNKNOWN, |p| Ok(module(p, &[])))
        .unwrap();
    assert_eq!(cache.len(), 1);
}

#[test]
fn cyclic_include_is_an_error() {
    let cache = ModuleCache::new();
    let result = cache.include("a.mp", Position::line(1), |_| {
        let inner = cache.include("a.mp", Position::line(2), |p| Ok(module(p, &[])));
        match inner {
            Err(ControlAction::Error(e)) => {
                assert!(matches!(e.kind, EvalErrorKind::IncludeError { .. }));
                Err(ControlAction::Error(e))
            }
            other => panic!("expected include error, got {other:?}"),
        }
    });
    assert!(result.is_err());
    assert!(cache.is_empty());
}

#[test]
fn nested_includes_on_one_thread() {
    let cache = ModuleCache::new();
    cache
        .include("outer.mp", Position::UNKNOWN, |p| {
            cache.include("inner.mp", Position::UNKNOWN, |q| Ok(module(q, &[("x", 1)])))?;
            Ok(module(p, &[("y", 2)]))
        })
        .unwrap();
    assert_eq!(cache.len(), 2);
    // Inner finished loading first, so it is searched first.
    let names: Vec<_> = cache.names().iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["inner", "x", "outer", "y"]);
}

#[test]
fn lookup_from_another_thread_during_include() {
    let cache = ModuleCache::new();
    cache
        .include("done.mp", Position::UNKNOWN, |p| Ok(module(p, &[("x", 1)])))
        .unwrap();
    cache
        .include("slow.mp", Position::UNKNOWN, |p| {
            let seen = std::thread::scope(|s| s.spawn(|| cache.lookup("x")).join().unwrap());
            assert_eq!(seen, Some(Value::int(1)));
            Ok(module(p, &[]))
        })
        .unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn panicking_include_leaves_path_includable() {
    let cache = ModuleCache::new();
    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        cache.include("flaky.mp", Position::UNKNOWN, |_| panic!("unit blew up"))
    }));
    assert!(unwound.is_err());
    assert!(cache.is_empty());

    let value = cache
        .include("flaky.mp", Position::UNKNOWN, |p| Ok(module(p, &[("ok", 1)])))
        .unwrap();
    assert!(matches!(value, Value::Module(_)));
}

#[test]
fn lookup_prefers_module_names_then_bindings() {
    let cache = ModuleCache::new();
    cache
        .include("math.mp", Position::UNKNOWN, |p| Ok(module(p, &[("pi", 3)])))
        .unwrap();
    assert!(matches!(cache.lookup("math"), Some(Value::Module(_))));
    assert_eq!(cache.lookup("pi"), Some(Value::int(3)));
    assert_eq!(cache.lookup("tau"), None);

    cache.clear();
    assert_eq!(cache.lookup("pi"), None);
}

#[test]
fn memory_loader() {
    let loader = MemoryLoader::new().with("a.mp", Program::default());
    assert_eq!(loader.load("a.mp"), Ok(Program::default()));
    assert_eq!(loader.load("b.mp"), Err("no such module: b.mp".to_string()));
}
