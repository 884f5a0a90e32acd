//! Tree construction helpers.
//!
//! Hosts embedding the engine without a parser, and the engine's own tests,
//! assemble syntax trees with these functions. Every node is created at
//! [`Position::UNKNOWN`]; use [`Expr::at`] / [`Stmt::at`] to attach a line.

use std::sync::Arc;

use super::{
    AssignOp, Block, CaseArm, CaseExpr, CatchClause, CatchPattern, Comprehension,
    ComprehensionOutput, Expr, ExprKind, ForEach, FunctionLit, Ident, IfBranch, InfixOp, Param,
    PostfixOp, PrefixOp, Program, Stmt, StmtKind, StrPart, TryExpr,
};
use crate::Position;

const AT: Position = Position::UNKNOWN;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, AT)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, AT)
}

pub fn name(name: &str) -> Ident {
    Ident::new(name, AT)
}

pub fn block(statements: Vec<Stmt>) -> Block {
    Block::new(statements, AT)
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program::new(statements)
}

// Literals

pub fn int(value: i64) -> Expr {
    expr(ExprKind::Int(value))
}

pub fn float(value: f64) -> Expr {
    expr(ExprKind::Float(value))
}

pub fn string(value: &str) -> Expr {
    expr(ExprKind::Str(value.into()))
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Bool(value))
}

pub fn nil() -> Expr {
    expr(ExprKind::Nil)
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Ident(name.into()))
}

pub fn interpolated(parts: Vec<StrPart>) -> Expr {
    expr(ExprKind::Interpolated(parts))
}

pub fn text(value: &str) -> StrPart {
    StrPart::Lit(value.into())
}

pub fn hole(value: Expr) -> StrPart {
    StrPart::Expr(value)
}

pub fn array(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Array(items))
}

pub fn hash(pairs: Vec<(Expr, Expr)>) -> Expr {
    expr(ExprKind::Hash(pairs))
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(items))
}

pub fn range(start: Expr, end: Expr) -> Expr {
    expr(ExprKind::Range {
        start: Box::new(start),
        end: Box::new(end),
    })
}

// Functions

/// Function literal with plain positional parameters.
pub fn function_lit(params: &[&str], body: Vec<Stmt>) -> Arc<FunctionLit> {
    function_with(params.iter().map(|p| param(p)).collect(), false, body)
}

/// Function literal with explicit parameters and variadic flag.
pub fn function_with(params: Vec<Param>, variadic: bool, body: Vec<Stmt>) -> Arc<FunctionLit> {
    Arc::new(FunctionLit {
        name: None,
        params,
        variadic,
        body: block(body),
        pos: AT,
    })
}

pub fn param(name_str: &str) -> Param {
    Param {
        name: name(name_str),
        default: None,
    }
}

pub fn param_default(name_str: &str, default: Expr) -> Param {
    Param {
        name: name(name_str),
        default: Some(default),
    }
}

/// `fn(params) { body }`
pub fn func(params: &[&str], body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Function(function_lit(params, body)))
}

/// `fn(params, rest...) { body }`
pub fn variadic_func(params: &[&str], body: Vec<Stmt>) -> Expr {
    let params = params.iter().map(|p| param(p)).collect();
    expr(ExprKind::Function(function_with(params, true, body)))
}

pub fn func_expr(lit: Arc<FunctionLit>) -> Expr {
    expr(ExprKind::Function(lit))
}

// Operators

pub fn prefix(op: PrefixOp, operand: Expr) -> Expr {
    expr(ExprKind::Prefix {
        op,
        operand: Box::new(operand),
    })
}

pub fn infix(op: InfixOp, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Infix {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn postfix(op: PostfixOp, target: Expr) -> Expr {
    expr(ExprKind::Postfix {
        op,
        target: Box::new(target),
    })
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    compound(AssignOp::Assign, target, value)
}

pub fn compound(op: AssignOp, target: Expr, value: Expr) -> Expr {
    expr(ExprKind::Assign {
        op,
        target: Box::new(target),
        value: Box::new(value),
    })
}

pub fn ternary(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    expr(ExprKind::Ternary {
        cond: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

pub fn pipe(left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Pipe {
        left: Box::new(left),
        right: Box::new(right),
    })
}

// Calls and access

/// `name(args)`
pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    call_expr(ident(callee), args)
}

pub fn call_expr(callee: Expr, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        args,
    })
}

/// `receiver.method(args)`
pub fn method(receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::MethodCall {
        receiver: Box::new(receiver),
        method: name(method),
        args,
    })
}

pub fn member(object: Expr, field: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        name: name(field),
    })
}

pub fn index(object: Expr, index: Expr) -> Expr {
    expr(ExprKind::Index {
        object: Box::new(object),
        index: Box::new(index),
    })
}

pub fn slice(object: Expr, start: Option<Expr>, end: Option<Expr>) -> Expr {
    expr(ExprKind::Slice {
        object: Box::new(object),
        start: start.map(Box::new),
        end: end.map(Box::new),
    })
}

// Control

pub fn if_(cond: Expr, then: Vec<Stmt>, otherwise: Option<Vec<Stmt>>) -> Expr {
    if_chain(vec![(cond, then)], otherwise)
}

/// `if c1 {..} else if c2 {..} else {..}`
pub fn if_chain(branches: Vec<(Expr, Vec<Stmt>)>, otherwise: Option<Vec<Stmt>>) -> Expr {
    expr(ExprKind::If {
        branches: branches
            .into_iter()
            .map(|(cond, body)| IfBranch {
                cond,
                body: block(body),
            })
            .collect(),
        otherwise: otherwise.map(block),
    })
}

pub fn unless(cond: Expr, body: Vec<Stmt>, otherwise: Option<Vec<Stmt>>) -> Expr {
    expr(ExprKind::Unless {
        cond: Box::new(cond),
        body: block(body),
        otherwise: otherwise.map(block),
    })
}

pub fn while_(cond: Expr, body: Vec<Stmt>) -> Expr {
    expr(ExprKind::While {
        cond: Box::new(cond),
        body: block(body),
    })
}

pub fn do_(body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Do(block(body)))
}

/// `for (init; cond; update) { body }`
pub fn for_c(
    init: Option<Stmt>,
    cond: Option<Expr>,
    update: Option<Expr>,
    body: Vec<Stmt>,
) -> Expr {
    expr(ExprKind::For {
        init: init.map(Box::new),
        cond: cond.map(Box::new),
        update: update.map(Box::new),
        body: block(body),
    })
}

pub fn forever(body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Forever(block(body)))
}

/// `for value in iterable { body }`
pub fn for_in(value: &str, iterable: Expr, body: Vec<Stmt>) -> Expr {
    for_each(None, value, iterable, None, body)
}

/// `for key, value in iterable where filter { body }`
pub fn for_each(
    key: Option<&str>,
    value: &str,
    iterable: Expr,
    filter: Option<Expr>,
    body: Vec<Stmt>,
) -> Expr {
    expr(ExprKind::ForEach(Box::new(ForEach {
        key: key.map(name),
        value: name(value),
        iterable,
        filter,
        body: block(body),
    })))
}

/// `[output for value in iterable where filter]`
pub fn array_comp(value: &str, iterable: Expr, filter: Option<Expr>, output: Expr) -> Expr {
    expr(ExprKind::Comprehension(Box::new(Comprehension {
        key: None,
        value: name(value),
        iterable,
        filter,
        output: ComprehensionOutput::Array(output),
    })))
}

/// `{k => v for key, value in iterable where filter}`
pub fn hash_comp(
    key: Option<&str>,
    value: &str,
    iterable: Expr,
    filter: Option<Expr>,
    output: (Expr, Expr),
) -> Expr {
    expr(ExprKind::Comprehension(Box::new(Comprehension {
        key: key.map(name),
        value: name(value),
        iterable,
        filter,
        output: ComprehensionOutput::Hash {
            key: output.0,
            value: output.1,
        },
    })))
}

pub fn grep(var: &str, iterable: Expr, cond: Expr) -> Expr {
    expr(ExprKind::Grep {
        var: name(var),
        iterable: Box::new(iterable),
        cond: Box::new(cond),
    })
}

pub fn map(var: &str, iterable: Expr, body: Expr) -> Expr {
    expr(ExprKind::Map {
        var: name(var),
        iterable: Box::new(iterable),
        body: Box::new(body),
    })
}

/// `case subject is|in { patterns => body ... else => otherwise }`
pub fn case(
    subject: Expr,
    whole_match: bool,
    arms: Vec<(Vec<Expr>, Vec<Stmt>)>,
    otherwise: Option<Vec<Stmt>>,
) -> Expr {
    expr(ExprKind::Case(Box::new(CaseExpr {
        subject,
        whole_match,
        arms: arms
            .into_iter()
            .map(|(patterns, body)| CaseArm {
                patterns,
                body: block(body),
            })
            .collect(),
        otherwise: otherwise.map(block),
    })))
}

pub fn try_(body: Vec<Stmt>, catches: Vec<CatchClause>, finally: Option<Vec<Stmt>>) -> Expr {
    expr(ExprKind::Try(Box::new(TryExpr {
        body: block(body),
        catches,
        finally: finally.map(block),
    })))
}

pub fn catch_str(message: &str, body: Vec<Stmt>) -> CatchClause {
    CatchClause {
        pattern: CatchPattern::Literal(message.into()),
        body: block(body),
    }
}

pub fn catch_name(var: &str, body: Vec<Stmt>) -> CatchClause {
    CatchClause {
        pattern: CatchPattern::Ident(name(var)),
        body: block(body),
    }
}

pub fn catch_else(body: Vec<Stmt>) -> CatchClause {
    CatchClause {
        pattern: CatchPattern::Else,
        body: block(body),
    }
}

pub fn struct_(members: Vec<Stmt>) -> Expr {
    expr(ExprKind::Struct(block(members)))
}

pub fn enum_(variants: Vec<(&str, Option<Expr>)>) -> Expr {
    expr(ExprKind::Enum(
        variants
            .into_iter()
            .map(|(variant, value)| (name(variant), value))
            .collect(),
    ))
}

pub fn include(path: &str) -> Expr {
    expr(ExprKind::Include(path.into()))
}

// Statements

pub fn expr_stmt(value: Expr) -> Stmt {
    let pos = value.pos;
    Stmt::new(StmtKind::Expr(value), pos)
}

pub fn let_(var: &str, value: Expr) -> Stmt {
    let_many(&[var], vec![value])
}

pub fn let_many(vars: &[&str], values: Vec<Expr>) -> Stmt {
    stmt(StmtKind::Let {
        names: vars.iter().map(|v| name(v)).collect(),
        values,
    })
}

pub fn ret(value: Expr) -> Stmt {
    ret_many(vec![value])
}

pub fn ret_many(values: Vec<Expr>) -> Stmt {
    stmt(StmtKind::Return(values))
}

/// `fn name(params) { body }`
pub fn fn_decl(fn_name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    let lit = function_lit(params, body);
    fn_decl_lit(fn_name, lit)
}

pub fn fn_decl_lit(fn_name: &str, lit: Arc<FunctionLit>) -> Stmt {
    let mut lit = Arc::unwrap_or_clone(lit);
    lit.name = Some(fn_name.into());
    stmt(StmtKind::Function {
        name: name(fn_name),
        func: Arc::new(lit),
    })
}

pub fn defer(call: Expr) -> Stmt {
    stmt(StmtKind::Defer(Arc::new(call)))
}

pub fn spawn(call: Expr) -> Stmt {
    stmt(StmtKind::Spawn(Arc::new(call)))
}

pub fn throw(value: Expr) -> Stmt {
    stmt(StmtKind::Throw(value))
}

pub fn break_() -> Stmt {
    stmt(StmtKind::Break)
}

pub fn continue_() -> Stmt {
    stmt(StmtKind::Continue)
}

pub fn block_stmt(statements: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(block(statements)))
}
