use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use magpie_ir::Position;
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::{ControlAction, EvalErrorKind};
use crate::print_handler::PrintHandler;

/// Counts every callback it is asked to run.
struct CountingContext {
    calls: usize,
    output: PrintHandler,
}

impl CountingContext {
    fn new() -> Self {
        CountingContext {
            calls: 0,
            output: PrintHandler::Silent,
        }
    }
}

impl CallContext for CountingContext {
    fn call(&mut self, _callee: &Value, _args: Vec<Value>) -> EvalResult {
        self.calls += 1;
        Ok(Value::nil())
    }

    fn position(&self) -> Position {
        Position::line(7)
    }

    fn output(&self) -> &PrintHandler {
        &self.output
    }
}

fn construct(name: &str) -> Value {
    let registry = GlobalRegistry::standard();
    let Some(Value::Builtin(ctor)) = registry.get(name) else {
        panic!("{name} is not registered");
    };
    ctor.call(&mut CountingContext::new(), Vec::new()).unwrap()
}

fn call(target: &Value, method: &str, args: Vec<Value>) -> EvalResult {
    target.call_method(&mut CountingContext::new(), method, args)
}

fn error_kind(result: EvalResult) -> EvalErrorKind {
    match result {
        Err(ControlAction::Error(e)) => e.kind,
        other => panic!("expected an error, got {other:?}"),
    }
}

#[test]
fn kinds() {
    for (name, kind) in [
        ("sync.WaitGroup", "WAITGROUP"),
        ("sync.Mutex", "MUTEX"),
        ("sync.RWMutex", "RWMUTEX"),
        ("sync.Cond", "COND"),
        ("sync.Once", "ONCE"),
    ] {
        assert_eq!(construct(name).kind(), kind);
    }
}

#[test]
fn wait_group_waits_for_workers() {
    let wg = construct("sync.WaitGroup");
    let finished = std::sync::Arc::new(AtomicUsize::new(0));
    call(&wg, "add", vec![Value::int(3)]).unwrap();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let wg = wg.clone();
            let finished = finished.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                finished.fetch_add(1, Ordering::SeqCst);
                call(&wg, "done", vec![]).unwrap();
            })
        })
        .collect();
    call(&wg, "wait", vec![]).unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 3);
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn wait_group_counter_cannot_go_negative() {
    let wg = construct("sync.WaitGroup");
    let err = call(&wg, "done", vec![]);
    assert!(matches!(error_kind(err), EvalErrorKind::WaitGroupNegative));
    // A zero counter does not block.
    call(&wg, "wait", vec![]).unwrap();
}

#[test]
fn mutex_lock_and_unlock() {
    let m = construct("sync.Mutex");
    call(&m, "lock", vec![]).unwrap();
    assert_eq!(call(&m, "tryLock", vec![]).unwrap(), Value::boolean(false));
    call(&m, "unlock", vec![]).unwrap();
    assert_eq!(call(&m, "tryLock", vec![]).unwrap(), Value::boolean(true));
    call(&m, "unlock", vec![]).unwrap();

    let Err(ControlAction::Error(e)) = call(&m, "unlock", vec![]) else {
        panic!("expected unlock error");
    };
    assert!(matches!(e.kind, EvalErrorKind::UnlockError { ref kind } if kind == "MUTEX"));
}

#[test]
fn mutex_serializes_threads() {
    let m = construct("sync.Mutex");
    let counter = std::sync::Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let m = m.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    call(&m, "lock", vec![]).unwrap();
                    let seen = counter.load(Ordering::SeqCst);
                    counter.store(seen + 1, Ordering::SeqCst);
                    call(&m, "unlock", vec![]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 200);
}

#[test]
fn rw_mutex_allows_shared_readers() {
    let rw = construct("sync.RWMutex");
    call(&rw, "rlock", vec![]).unwrap();
    call(&rw, "rlock", vec![]).unwrap();
    call(&rw, "runlock", vec![]).unwrap();
    call(&rw, "runlock", vec![]).unwrap();
    assert!(matches!(
        error_kind(call(&rw, "runlock", vec![])),
        EvalErrorKind::UnlockError { .. }
    ));
    call(&rw, "lock", vec![]).unwrap();
    call(&rw, "unlock", vec![]).unwrap();
}

#[test]
fn cond_signal_wakes_a_waiter() {
    let cond = construct("sync.Cond");
    let woke = std::sync::Arc::new(AtomicUsize::new(0));
    let waiter = {
        let cond = cond.clone();
        let woke = woke.clone();
        thread::spawn(move || {
            call(&cond, "wait", vec![]).unwrap();
            woke.fetch_add(1, Ordering::SeqCst);
        })
    };
    // Keep signalling until the waiter has registered and consumed a permit.
    while woke.load(Ordering::SeqCst) == 0 {
        call(&cond, "signal", vec![]).unwrap();
        thread::sleep(Duration::from_millis(1));
    }
    waiter.join().unwrap();
}

#[test]
fn cond_rejects_non_mutex() {
    let registry = GlobalRegistry::standard();
    let Some(Value::Builtin(ctor)) = registry.get("sync.Cond") else {
        panic!("sync.Cond is not registered");
    };
    let result = ctor.call(&mut CountingContext::new(), vec![Value::int(1)]);
    assert!(matches!(error_kind(result), EvalErrorKind::ParamTypeError { .. }));

    let mutex = construct("sync.Mutex");
    let cond = ctor.call(&mut CountingContext::new(), vec![mutex]).unwrap();
    assert_eq!(cond.kind(), "COND");
}

#[test]
fn once_runs_its_callback_once() {
    let once = construct("sync.Once");
    let callback = Value::Builtin(crate::builtins::lookup("println").unwrap());
    let mut ctx = CountingContext::new();
    for _ in 0..3 {
        once.call_method(&mut ctx, "do", vec![callback.clone()]).unwrap();
    }
    assert_eq!(ctx.calls, 1);
}

#[test]
fn unknown_method_suggests() {
    let wg = construct("sync.WaitGroup");
    let Err(ControlAction::Error(e)) = call(&wg, "wiat", vec![]) else {
        panic!("expected no-method error");
    };
    assert_eq!(
        e.to_string(),
        "line 7: no method 'wiat' for WAITGROUP, did you mean 'wait'?"
    );
}
