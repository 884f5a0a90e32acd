//! Evaluation policies.
//!
//! `EvalMode` selects where output goes and whether recursion is bounded.
//! `InternalFaultPolicy` decides what happens when evaluation panics.

use crate::print_handler::{buffer_handler, stdout_handler, SharedPrintHandler};

/// Evaluation mode, chosen once per interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Running a script for the host: stdout, unbounded recursion.
    #[default]
    Interpret,
    /// Running under a test harness: captured output, bounded recursion.
    TestRun,
}

impl EvalMode {
    /// Maximum call depth, or `None` when only `stacker` growth applies.
    #[inline]
    pub fn max_recursion_depth(self) -> Option<usize> {
        match self {
            Self::Interpret => None,
            Self::TestRun => Some(500),
        }
    }

    /// Print handler used when the builder is not given one.
    pub fn default_print_handler(self) -> SharedPrintHandler {
        match self {
            Self::Interpret => stdout_handler(),
            Self::TestRun => buffer_handler(),
        }
    }
}

/// What to do with a panic that escapes evaluation.
///
/// Faults are always logged with `tracing::error!`. The policy only decides
/// what the caller of `eval_program` (or a spawned task) observes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InternalFaultPolicy {
    /// Surface the fault as an `InternalError`.
    #[default]
    Propagate,
    /// Yield `nil` as if the program produced no value.
    Swallow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recursion_limits() {
        assert_eq!(EvalMode::Interpret.max_recursion_depth(), None);
        assert_eq!(EvalMode::TestRun.max_recursion_depth(), Some(500));
    }

    #[test]
    fn test_mode_captures_output() {
        let handler = EvalMode::TestRun.default_print_handler();
        handler.println("captured");
        assert_eq!(handler.output(), "captured\n");
    }

    #[test]
    fn faults_propagate_by_default() {
        assert_eq!(InternalFaultPolicy::default(), InternalFaultPolicy::Propagate);
    }
}
