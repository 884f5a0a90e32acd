//! Syntax tree nodes.
//!
//! A [`Program`] is a list of [`Stmt`]s. Expression-oriented constructs
//! (loops, `if`, `case`, `try`) are [`ExprKind`] variants because every one
//! of them produces a value.

pub mod build;
mod expr;
mod operators;
mod stmt;

use std::sync::Arc;

use crate::Position;

pub use expr::{
    CaseArm, CaseExpr, CatchClause, CatchPattern, Comprehension, ComprehensionOutput, Expr,
    ExprKind, ForEach, FunctionLit, IfBranch, Param, StrPart, TryExpr,
};
pub use operators::{AssignOp, InfixOp, PostfixOp, PrefixOp};
pub use stmt::{Block, Program, Stmt, StmtKind};

/// An identifier occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: Arc<str>,
    pub pos: Position,
}

impl Ident {
    pub fn new(name: impl Into<Arc<str>>, pos: Position) -> Self {
        Ident {
            name: name.into(),
            pos,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}
