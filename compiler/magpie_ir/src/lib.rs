//! Magpie IR - syntax tree types for the Magpie evaluator.
//!
//! The lexer and parser live outside this workspace. They hand the evaluator
//! a [`Program`] built from the node types in [`ast`], where every node
//! carries a [`Position`] used to stamp runtime errors with a `line N: `
//! prefix.
//!
//! # Design
//!
//! - **Shared, immutable nodes**: function literals, deferred calls and
//!   spawned calls are held behind `Arc` so runtime values can keep them
//!   alive across threads without copying the tree.
//! - **Positions, not offsets**: nodes store a resolved line/column.
//!   Parsers that track byte offsets convert them with [`LineIndex`].
//! - **No parser dependency**: [`ast::build`] assembles trees directly for
//!   hosts and tests.

pub mod ast;
mod span;

pub use ast::{
    AssignOp, Block, CaseArm, CaseExpr, CatchClause, CatchPattern, Comprehension,
    ComprehensionOutput, Expr, ExprKind, ForEach, FunctionLit, Ident, IfBranch, InfixOp, Param,
    PostfixOp, PrefixOp, Program, Stmt, StmtKind, StrPart, TryExpr,
};
pub use span::{LineIndex, Position, Span};
