//! Statements, blocks and programs.

use std::sync::Arc;

use super::{Expr, FunctionLit, Ident};
use crate::Position;

/// A whole compilation unit: the main script or one include unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}

/// A braced statement list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub pos: Position,
}

impl Block {
    pub fn new(statements: Vec<Stmt>, pos: Position) -> Self {
        Block { statements, pos }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Stmt { kind, pos }
    }

    #[must_use]
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `let a, b = 1, 2` / `let (a, b) = pair`.
    ///
    /// With a single value and several names, the value is destructured if
    /// it is a tuple or array.
    Let { names: Vec<Ident>, values: Vec<Expr> },
    /// `return`, `return x` or `return x, y` (multiple values form a tuple).
    Return(Vec<Expr>),
    /// Expression evaluated for its value.
    Expr(Expr),
    /// Named function declaration: `fn add(a, b) { ... }`.
    Function { name: Ident, func: Arc<FunctionLit> },
    /// `defer call(...)`; only legal inside a function body.
    Defer(Arc<Expr>),
    /// `spawn call(...)`; runs the call on a new task.
    Spawn(Arc<Expr>),
    /// `throw "message"`.
    Throw(Expr),
    Break,
    Continue,
    /// Nested block with its own scope.
    Block(Block),
}
