//! Loops, comprehensions, `grep` and `map`.

use magpie_ir::ast::build::*;
use magpie_ir::{AssignOp, Expr, InfixOp, PostfixOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::EvalErrorKind;

fn double(var: &str) -> Expr {
    infix(InfixOp::Mul, ident(var), int(2))
}

fn equals(var: &str, n: i64) -> Expr {
    infix(InfixOp::Eq, ident(var), int(n))
}

#[test]
fn for_in_collects_body_values() {
    let result = eval_ok(vec![expr_stmt(for_in(
        "x",
        array(vec![int(1), int(2), int(3)]),
        vec![expr_stmt(double("x"))],
    ))]);
    assert_eq!(result, ints(&[2, 4, 6]));
}

#[test]
fn continue_and_filter_skip_results() {
    let skipped = eval_ok(vec![expr_stmt(for_in(
        "x",
        array(vec![int(1), int(2), int(3)]),
        vec![
            expr_stmt(if_(equals("x", 2), vec![continue_()], None)),
            expr_stmt(double("x")),
        ],
    ))]);
    assert_eq!(skipped, ints(&[2, 6]));

    let filtered = eval_ok(vec![expr_stmt(for_each(
        None,
        "x",
        array(vec![int(1), int(2), int(3)]),
        Some(infix(InfixOp::NotEq, ident("x"), int(2))),
        vec![expr_stmt(double("x"))],
    ))]);
    assert_eq!(filtered, ints(&[2, 6]));
}

#[test]
fn break_keeps_results_so_far() {
    let result = eval_ok(vec![expr_stmt(for_in(
        "x",
        array(vec![int(1), int(2), int(3)]),
        vec![
            expr_stmt(if_(equals("x", 2), vec![break_()], None)),
            expr_stmt(double("x")),
        ],
    ))]);
    assert_eq!(result, ints(&[2]));
}

#[test]
fn single_variable_over_hash_binds_keys() {
    let result = eval_ok(vec![expr_stmt(for_in(
        "k",
        hash(vec![(string("a"), int(1)), (string("b"), int(2))]),
        vec![expr_stmt(ident("k"))],
    ))]);
    assert_eq!(result, strs(&["a", "b"]));
}

#[test]
fn two_variables_bind_key_and_value() {
    let result = eval_ok(vec![
        let_("total", int(0)),
        expr_stmt(for_each(
            Some("k"),
            "v",
            hash(vec![(string("a"), int(1)), (string("b"), int(2))]),
            None,
            vec![
                expr_stmt(compound(AssignOp::Add, ident("total"), ident("v"))),
                expr_stmt(ident("k")),
            ],
        )),
        expr_stmt(ident("total")),
    ]);
    assert_eq!(result, Value::int(3));

    let indices = eval_ok(vec![expr_stmt(for_each(
        Some("i"),
        "c",
        string("ab"),
        None,
        vec![expr_stmt(interpolated(vec![hole(ident("i")), hole(ident("c"))]))],
    ))]);
    assert_eq!(indices, strs(&["0a", "1b"]));
}

#[test]
fn dollar_underscore_is_the_index() {
    let result = eval_ok(vec![expr_stmt(for_in(
        "x",
        array(vec![string("a"), string("b"), string("c")]),
        vec![expr_stmt(ident("$_"))],
    ))]);
    assert_eq!(result, ints(&[0, 1, 2]));
}

#[test]
fn ranges_and_strings_iterate() {
    let result = eval_ok(vec![expr_stmt(for_in(
        "n",
        range(int(3), int(5)),
        vec![expr_stmt(ident("n"))],
    ))]);
    assert_eq!(result, ints(&[3, 4, 5]));

    let result = eval_ok(vec![expr_stmt(for_in(
        "n",
        call("range", vec![int(3)]),
        vec![expr_stmt(ident("n"))],
    ))]);
    assert_eq!(result, ints(&[0, 1, 2]));

    let result = eval_ok(vec![expr_stmt(for_in(
        "c",
        string("héj"),
        vec![expr_stmt(ident("c"))],
    ))]);
    assert_eq!(result, strs(&["h", "é", "j"]));
}

#[test]
fn body_may_mutate_the_iterated_array() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1), int(2)])),
        expr_stmt(for_in(
            "x",
            ident("a"),
            vec![expr_stmt(method(ident("a"), "push", vec![ident("x")]))],
        )),
        expr_stmt(ident("a")),
    ]);
    assert_eq!(result, ints(&[1, 2, 1, 2]));
}

#[test]
fn loop_variables_do_not_leak() {
    let err = eval_err(vec![
        expr_stmt(for_in("x", array(vec![int(1)]), vec![let_("y", int(2))])),
        expr_stmt(ident("y")),
    ]);
    assert!(err.message.starts_with("unknown identifier: 'y'"), "{err}");
}

#[test]
fn not_iterable() {
    let err = eval_err(vec![expr_stmt(for_in("x", int(5), vec![]))]);
    assert_eq!(err.kind, EvalErrorKind::NotIterable {
        kind: "INTEGER".to_string()
    });
}

#[test]
fn while_runs_until_condition_fails() {
    let result = eval_ok(vec![
        let_("i", int(0)),
        let_("sum", int(0)),
        expr_stmt(while_(
            infix(InfixOp::Lt, ident("i"), int(4)),
            vec![
                expr_stmt(compound(AssignOp::Add, ident("sum"), ident("i"))),
                expr_stmt(postfix(PostfixOp::Increment, ident("i"))),
            ],
        )),
        expr_stmt(ident("sum")),
    ]);
    assert_eq!(result, Value::int(6));
}

#[test]
fn c_style_for_runs_update_after_continue() {
    let result = eval_ok(vec![
        let_("total", int(0)),
        expr_stmt(for_c(
            Some(let_("i", int(0))),
            Some(infix(InfixOp::Lt, ident("i"), int(5))),
            Some(postfix(PostfixOp::Increment, ident("i"))),
            vec![
                expr_stmt(if_(equals("i", 2), vec![continue_()], None)),
                expr_stmt(compound(AssignOp::Add, ident("total"), ident("i"))),
            ],
        )),
        expr_stmt(ident("total")),
    ]);
    assert_eq!(result, Value::int(8));
}

#[test]
fn c_style_init_is_loop_scoped() {
    let err = eval_err(vec![
        expr_stmt(for_c(
            Some(let_("i", int(0))),
            Some(infix(InfixOp::Lt, ident("i"), int(1))),
            Some(postfix(PostfixOp::Increment, ident("i"))),
            vec![],
        )),
        expr_stmt(ident("i")),
    ]);
    assert!(err.message.starts_with("unknown identifier: 'i'"), "{err}");
}

#[test]
fn forever_and_do_stop_at_break() {
    for make in [forever, do_] {
        let result = eval_ok(vec![
            let_("n", int(0)),
            expr_stmt(make(vec![
                expr_stmt(postfix(PostfixOp::Increment, ident("n"))),
                expr_stmt(if_(
                    infix(InfixOp::GtEq, ident("n"), int(3)),
                    vec![break_()],
                    None,
                )),
            ])),
            expr_stmt(ident("n")),
        ]);
        assert_eq!(result, Value::int(3));
    }
}

#[test]
fn array_comprehension_with_filter() {
    let result = eval_ok(vec![expr_stmt(array_comp(
        "x",
        range(int(1), int(6)),
        Some(infix(InfixOp::Eq, infix(InfixOp::Mod, ident("x"), int(2)), int(1))),
        infix(InfixOp::Mul, ident("x"), ident("x")),
    ))]);
    assert_eq!(result, ints(&[1, 9, 25]));
}

#[test]
fn hash_comprehension() {
    let result = eval_ok(vec![expr_stmt(hash_comp(
        Some("i"),
        "name",
        array(vec![string("a"), string("b")]),
        None,
        (ident("name"), ident("i")),
    ))]);
    assert_eq!(result.display(), "{\"a\" : 0, \"b\" : 1}");
}

#[test]
fn grep_keeps_matching_elements() {
    let result = eval_ok(vec![expr_stmt(grep(
        "s",
        array(vec![string("apple"), string("kiwi"), string("avocado")]),
        infix(InfixOp::Match, ident("s"), string("^a")),
    ))]);
    assert_eq!(result, strs(&["apple", "avocado"]));
}

#[test]
fn grep_over_hash_keeps_keys() {
    let result = eval_ok(vec![expr_stmt(grep(
        "k",
        hash(vec![(string("x"), int(1)), (string("yy"), int(2))]),
        infix(InfixOp::Gt, call("len", vec![ident("k")]), int(1)),
    ))]);
    assert_eq!(result, strs(&["yy"]));
}

#[test]
fn map_transforms_each_element() {
    let result = eval_ok(vec![expr_stmt(map(
        "x",
        array(vec![int(1), int(2)]),
        infix(InfixOp::Add, ident("x"), ident("$_")),
    ))]);
    assert_eq!(result, ints(&[1, 3]));
}

#[test]
fn channel_iteration_ends_when_closed() {
    let result = eval_ok(vec![
        let_("ch", call("chan", vec![int(3)])),
        expr_stmt(method(ident("ch"), "send", vec![int(1)])),
        expr_stmt(method(ident("ch"), "send", vec![int(2)])),
        expr_stmt(method(ident("ch"), "close", vec![])),
        expr_stmt(for_in("v", ident("ch"), vec![expr_stmt(ident("v"))])),
    ]);
    assert_eq!(result, ints(&[1, 2]));
}
