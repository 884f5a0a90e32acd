//! Stack growth for deeply nested evaluation.
//!
//! Every recursive entry into the evaluator goes through
//! [`ensure_sufficient_stack`], so deep expression trees and deep script
//! recursion grow the native stack instead of overflowing it. Spawned tasks
//! start on a fresh OS thread and rely on the same mechanism.

/// Minimum stack space to keep available before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Stack space allocated each time the red zone is reached (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
