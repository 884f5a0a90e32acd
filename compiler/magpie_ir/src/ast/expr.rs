//! Expression nodes.

use std::sync::Arc;

use super::{AssignOp, Block, Ident, InfixOp, PostfixOp, PrefixOp, Stmt};
use crate::Position;

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Expr { kind, pos }
    }

    /// Same node re-tagged with a source position.
    #[must_use]
    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    /// Whether the node is a call form accepted by `defer`, `spawn` and `|>`.
    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Call { .. } | ExprKind::MethodCall { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    // Literals
    Ident(Arc<str>),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bool(bool),
    Nil,
    /// `"sum: {a + b}"`
    Interpolated(Vec<StrPart>),
    Array(Vec<Expr>),
    /// `{k => v, ...}` in source order.
    Hash(Vec<(Expr, Expr)>),
    Tuple(Vec<Expr>),
    /// `start..end`, inclusive on both ends.
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    Function(Arc<FunctionLit>),
    /// `struct { let x = 1; fn get() { x } }`
    Struct(Block),
    /// `enum { RED, GREEN = 5, BLUE }`
    Enum(Vec<(Ident, Option<Expr>)>),

    // Operators
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `x++`; the target is an identifier, index or member expression.
    Postfix {
        op: PostfixOp,
        target: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `value |> f(args)`
    Pipe {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // Calls and access
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        name: Ident,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `a[start:end]`, either bound optional.
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },

    // Control
    If {
        branches: Vec<IfBranch>,
        otherwise: Option<Block>,
    },
    /// `unless cond { ... } else { ... }`
    Unless {
        cond: Box<Expr>,
        body: Block,
        otherwise: Option<Block>,
    },
    While {
        cond: Box<Expr>,
        body: Block,
    },
    /// `do { ... }` loops until `break`.
    Do(Block),
    /// `for (init; cond; update) { ... }`
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Box<Expr>>,
        update: Option<Box<Expr>>,
        body: Block,
    },
    /// `for { ... }`
    Forever(Block),
    ForEach(Box<ForEach>),
    Comprehension(Box<Comprehension>),
    /// `grep x in items { cond }`
    Grep {
        var: Ident,
        iterable: Box<Expr>,
        cond: Box<Expr>,
    },
    /// `map x in items { expr }`
    Map {
        var: Ident,
        iterable: Box<Expr>,
        body: Box<Expr>,
    },
    Case(Box<CaseExpr>),
    Try(Box<TryExpr>),
    /// `include "path"`
    Include(Arc<str>),
}

/// Piece of an interpolated string.
#[derive(Clone, Debug, PartialEq)]
pub enum StrPart {
    Lit(Arc<str>),
    Expr(Expr),
}

/// A function literal; shared by every closure created from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionLit {
    /// Declared name, if any (used in diagnostics and `.name()`).
    pub name: Option<Arc<str>>,
    pub params: Vec<Param>,
    /// The last parameter collects excess arguments into an array.
    pub variadic: bool,
    pub body: Block,
    pub pos: Position,
}

impl FunctionLit {
    /// Number of leading parameters without a default value.
    pub fn required_params(&self) -> usize {
        let declared = if self.variadic {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        };
        self.params[..declared]
            .iter()
            .take_while(|p| p.default.is_none())
            .count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfBranch {
    pub cond: Expr,
    pub body: Block,
}

/// `for k, v in iterable where filter { body }`
///
/// With one variable, arrays and strings bind the element and hashes bind the
/// key. With two, the first binds the index (or key) and the second the value.
#[derive(Clone, Debug, PartialEq)]
pub struct ForEach {
    pub key: Option<Ident>,
    pub value: Ident,
    pub iterable: Expr,
    pub filter: Option<Expr>,
    pub body: Block,
}

/// `[expr for x in iterable where filter]` / `{k => v for x in iterable}`
#[derive(Clone, Debug, PartialEq)]
pub struct Comprehension {
    pub key: Option<Ident>,
    pub value: Ident,
    pub iterable: Expr,
    pub filter: Option<Expr>,
    pub output: ComprehensionOutput,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ComprehensionOutput {
    Array(Expr),
    Hash { key: Expr, value: Expr },
}

/// `case subject is { a, b => {...} ... else => {...} }`
#[derive(Clone, Debug, PartialEq)]
pub struct CaseExpr {
    pub subject: Expr,
    /// `is` (equality) when true, `in` (regex match on display strings) when false.
    pub whole_match: bool,
    pub arms: Vec<CaseArm>,
    pub otherwise: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseArm {
    pub patterns: Vec<Expr>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TryExpr {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub pattern: CatchPattern,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CatchPattern {
    /// `catch "message"`
    Literal(Arc<str>),
    /// `catch name`: compares against `name` when already bound, otherwise
    /// catches everything and binds the message to `name`.
    Ident(Ident),
    /// `catch else`
    Else,
}
