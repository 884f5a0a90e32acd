//! The `sync` collaborator module: task coordination primitives.
//!
//! Each primitive is a [`HostObject`] built on `parking_lot` locks and
//! condition variables, so blocking in one task never holds a lock another
//! task needs to make progress. Constructors are registered in the global
//! registry as `sync.WaitGroup()`, `sync.Mutex()`, `sync.RWMutex()`,
//! `sync.Cond(mutex?)` and `sync.Once()`.

use std::any::Any;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::errors::{param_type, unlock_error, wait_group_negative, EvalResult};
use crate::methods::{no_such_method, require_args, require_args_between, require_callable_arg, require_int_arg};
use crate::registry::GlobalRegistry;
use crate::value::{CallContext, HostObject};
use crate::Value;

/// Install the `sync.*` constructors.
pub fn register(registry: &GlobalRegistry) {
    registry.register_fn("sync.WaitGroup", |_, _| Ok(Value::host(WaitGroup::default())));
    registry.register_fn("sync.Mutex", |_, _| Ok(Value::host(SyncMutex::default())));
    registry.register_fn("sync.RWMutex", |_, _| Ok(Value::host(RwMutex::default())));
    registry.register_fn("sync.Cond", new_cond);
    registry.register_fn("sync.Once", |_, _| Ok(Value::host(Once::default())));
}

// WaitGroup

#[derive(Debug, Default)]
pub struct WaitGroup {
    count: Mutex<i64>,
    zero: Condvar,
}

const WAIT_GROUP_METHODS: &[&str] = &["add", "done", "wait"];

impl WaitGroup {
    fn add(&self, delta: i64) -> Result<(), ()> {
        let mut count = self.count.lock();
        let next = count.saturating_add(delta);
        if next < 0 {
            return Err(());
        }
        *count = next;
        if next == 0 {
            self.zero.notify_all();
        }
        Ok(())
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }
}

impl HostObject for WaitGroup {
    fn kind(&self) -> &str {
        "WAITGROUP"
    }

    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        let pos = ctx.position();
        let delta = match name {
            "add" => {
                require_args_between(pos, name, 0, 1, &args)?;
                if args.is_empty() {
                    1
                } else {
                    require_int_arg(pos, name, &args, 0)?
                }
            }
            "done" => {
                require_args(pos, name, 0, &args)?;
                -1
            }
            "wait" => {
                require_args(pos, name, 0, &args)?;
                self.wait();
                return Ok(Value::nil());
            }
            _ => return Err(no_such_method(pos, name, self.kind(), WAIT_GROUP_METHODS).into()),
        };
        self.add(delta).map_err(|()| wait_group_negative(pos))?;
        Ok(Value::nil())
    }

    fn methods(&self) -> &[&'static str] {
        WAIT_GROUP_METHODS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Mutex

/// A lock that is not tied to a guard's lifetime: `lock` and `unlock` are
/// separate script calls, possibly from different tasks.
#[derive(Debug, Default)]
pub struct SyncMutex {
    locked: Mutex<bool>,
    released: Condvar,
}

const MUTEX_METHODS: &[&str] = &["lock", "tryLock", "unlock"];

impl SyncMutex {
    pub fn lock(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.released.wait(&mut locked);
        }
        *locked = true;
    }

    pub fn try_lock(&self) -> bool {
        let mut locked = self.locked.lock();
        !std::mem::replace(&mut *locked, true)
    }

    /// Returns `false` if the mutex was not locked.
    pub fn unlock(&self) -> bool {
        let mut locked = self.locked.lock();
        if !*locked {
            return false;
        }
        *locked = false;
        self.released.notify_one();
        true
    }
}

impl HostObject for SyncMutex {
    fn kind(&self) -> &str {
        "MUTEX"
    }

    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        let pos = ctx.position();
        require_args(pos, name, 0, &args)?;
        match name {
            "lock" => self.lock(),
            "tryLock" => return Ok(Value::boolean(self.try_lock())),
            "unlock" => {
                if !self.unlock() {
                    return Err(unlock_error(pos, self.kind()).into());
                }
            }
            _ => return Err(no_such_method(pos, name, self.kind(), MUTEX_METHODS).into()),
        }
        Ok(Value::nil())
    }

    fn methods(&self) -> &[&'static str] {
        MUTEX_METHODS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// RWMutex

#[derive(Debug, Default)]
struct RwState {
    readers: usize,
    writer: bool,
}

#[derive(Debug, Default)]
pub struct RwMutex {
    state: Mutex<RwState>,
    changed: Condvar,
}

const RW_MUTEX_METHODS: &[&str] = &["lock", "rlock", "runlock", "unlock"];

impl HostObject for RwMutex {
    fn kind(&self) -> &str {
        "RWMUTEX"
    }

    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        let pos = ctx.position();
        require_args(pos, name, 0, &args)?;
        let mut state = self.state.lock();
        match name {
            "lock" => {
                while state.writer || state.readers > 0 {
                    self.changed.wait(&mut state);
                }
                state.writer = true;
            }
            "unlock" => {
                if !state.writer {
                    return Err(unlock_error(pos, self.kind()).into());
                }
                state.writer = false;
                self.changed.notify_all();
            }
            "rlock" => {
                while state.writer {
                    self.changed.wait(&mut state);
                }
                state.readers += 1;
            }
            "runlock" => {
                if state.readers == 0 {
                    return Err(unlock_error(pos, self.kind()).into());
                }
                state.readers -= 1;
                if state.readers == 0 {
                    self.changed.notify_all();
                }
            }
            _ => return Err(no_such_method(pos, name, self.kind(), RW_MUTEX_METHODS).into()),
        }
        Ok(Value::nil())
    }

    fn methods(&self) -> &[&'static str] {
        RW_MUTEX_METHODS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Cond

#[derive(Debug, Default)]
struct CondState {
    /// Bumped by `broadcast`; waiters from an older generation all wake.
    generation: u64,
    /// Wake-ups granted by `signal` and not yet consumed.
    permits: usize,
    waiters: usize,
}

/// Condition variable, optionally bound to a `sync.Mutex` that `wait`
/// releases while blocked and re-acquires before returning.
#[derive(Debug, Default)]
pub struct Cond {
    mutex: Option<Arc<dyn HostObject>>,
    state: Mutex<CondState>,
    wake: Condvar,
}

const COND_METHODS: &[&str] = &["broadcast", "signal", "wait"];

fn new_cond(ctx: &mut dyn CallContext, args: Vec<Value>) -> EvalResult {
    let pos = ctx.position();
    require_args_between(pos, "sync.Cond", 0, 1, &args)?;
    let mutex = match args.into_iter().next() {
        None => None,
        Some(Value::Host(h)) if h.as_any().is::<SyncMutex>() => Some(h),
        Some(other) => return Err(param_type(pos, "sync.Cond", 1, "MUTEX", other.kind()).into()),
    };
    Ok(Value::host(Cond {
        mutex,
        ..Cond::default()
    }))
}

impl Cond {
    fn bound_mutex(&self) -> Option<&SyncMutex> {
        self.mutex.as_ref()?.as_any().downcast_ref::<SyncMutex>()
    }

    fn wait(&self) {
        let mut state = self.state.lock();
        let generation = state.generation;
        state.waiters += 1;
        // Released while holding `state`, so a signal cannot slip in between.
        if let Some(m) = self.bound_mutex() {
            m.unlock();
        }
        loop {
            self.wake.wait(&mut state);
            if state.generation != generation {
                break;
            }
            if state.permits > 0 {
                state.permits -= 1;
                break;
            }
        }
        state.waiters -= 1;
        drop(state);
        if let Some(m) = self.bound_mutex() {
            m.lock();
        }
    }

    fn signal(&self) {
        let mut state = self.state.lock();
        if state.waiters > state.permits {
            state.permits += 1;
            self.wake.notify_all();
        }
    }

    fn broadcast(&self) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.permits = 0;
        self.wake.notify_all();
    }
}

impl HostObject for Cond {
    fn kind(&self) -> &str {
        "COND"
    }

    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        let pos = ctx.position();
        require_args(pos, name, 0, &args)?;
        match name {
            "wait" => self.wait(),
            "signal" => self.signal(),
            "broadcast" => self.broadcast(),
            _ => return Err(no_such_method(pos, name, self.kind(), COND_METHODS).into()),
        }
        Ok(Value::nil())
    }

    fn methods(&self) -> &[&'static str] {
        COND_METHODS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Once

#[derive(Debug, Default)]
pub struct Once {
    done: Mutex<bool>,
}

const ONCE_METHODS: &[&str] = &["do"];

impl HostObject for Once {
    fn kind(&self) -> &str {
        "ONCE"
    }

    fn call_method(&self, ctx: &mut dyn CallContext, name: &str, args: Vec<Value>) -> EvalResult {
        let pos = ctx.position();
        if name != "do" {
            return Err(no_such_method(pos, name, self.kind(), ONCE_METHODS).into());
        }
        require_args(pos, name, 1, &args)?;
        let f = require_callable_arg(pos, name, &args, 0)?;
        // Held across the call: concurrent callers wait for the first to finish.
        let mut done = self.done.lock();
        if *done {
            return Ok(Value::nil());
        }
        *done = true;
        ctx.call(f, Vec::new())?;
        Ok(Value::nil())
    }

    fn methods(&self) -> &[&'static str] {
        ONCE_METHODS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
