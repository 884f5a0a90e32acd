//! Expressions, operators, bindings and element access.

use magpie_ir::ast::build::*;
use magpie_ir::{AssignOp, Expr, InfixOp, PostfixOp, PrefixOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::EvalErrorKind;

fn add(left: Expr, right: Expr) -> Expr {
    infix(InfixOp::Add, left, right)
}

#[test]
fn integer_division_yields_float() {
    let result = eval_ok(vec![expr_stmt(infix(InfixOp::Div, int(7), int(2)))]);
    assert_eq!(result, Value::float(3.5));
}

#[test]
fn float_operand_promotes() {
    assert_eq!(eval_ok(vec![expr_stmt(add(int(1), float(2.5)))]), Value::float(3.5));
    assert_eq!(
        eval_ok(vec![expr_stmt(infix(InfixOp::Mul, float(2.0), int(3)))]),
        Value::float(6.0)
    );
}

#[test]
fn integer_arithmetic_stays_integer() {
    assert_eq!(eval_ok(vec![expr_stmt(infix(InfixOp::Mod, int(7), int(3)))]), Value::int(1));
    assert_eq!(eval_ok(vec![expr_stmt(infix(InfixOp::Pow, int(2), int(10)))]), Value::int(1024));
}

#[test]
fn error_short_circuits_the_rest_of_the_expression() {
    // 1 + (1 / 0) + println("never")
    let expr = add(
        add(int(1), infix(InfixOp::Div, int(1), int(0))),
        call("println", vec![string("never")]),
    );
    let (result, output) = eval_output(vec![expr_stmt(expr)]);
    let err = result.unwrap_err().into_error().unwrap();
    assert_eq!(err.kind, EvalErrorKind::DivideByZero);
    assert_eq!(output, "");
}

#[test]
fn error_stops_the_program_with_line_prefix() {
    let (result, output) = eval_output(vec![
        expr_stmt(call("println", vec![string("before")])),
        expr_stmt(infix(InfixOp::Div, int(1), int(0))).at(magpie_ir::Position::line(3)),
        expr_stmt(call("println", vec![string("after")])),
    ]);
    let err = result.unwrap_err().into_error().unwrap();
    assert_eq!(err.to_string(), "line 3: divide by zero");
    assert_eq!(output, "before\n");
}

#[test]
fn logical_operators_short_circuit() {
    let and = infix(InfixOp::And, boolean(false), ident("undefined_thing"));
    let or = infix(InfixOp::Or, boolean(true), ident("undefined_thing"));
    assert_eq!(eval_ok(vec![expr_stmt(and)]), Value::boolean(false));
    assert_eq!(eval_ok(vec![expr_stmt(or)]), Value::boolean(true));
}

#[test]
fn prefix_operators() {
    assert_eq!(eval_ok(vec![expr_stmt(prefix(PrefixOp::Neg, int(4)))]), Value::int(-4));
    assert_eq!(eval_ok(vec![expr_stmt(prefix(PrefixOp::Not, nil()))]), Value::boolean(true));
    let err = eval_err(vec![expr_stmt(prefix(PrefixOp::Neg, string("x")))]);
    assert_eq!(
        err.message,
        "unsupported operator for prefix expression: '-' on STRING"
    );
}

#[test]
fn interpolation_displays_values() {
    let result = eval_ok(vec![
        let_("who", string("magpie")),
        expr_stmt(interpolated(vec![
            text("hi "),
            hole(ident("who")),
            text(", "),
            hole(array(vec![int(1), string("a")])),
        ])),
    ]);
    assert_eq!(result, Value::string("hi magpie, [1, \"a\"]"));
}

#[test]
fn hash_literal_keeps_source_order() {
    let result = eval_ok(vec![expr_stmt(hash(vec![
        (string("b"), int(1)),
        (string("a"), int(2)),
        (int(3), boolean(true)),
    ]))]);
    assert_eq!(result.display(), "{\"b\" : 1, \"a\" : 2, 3 : true}");
}

#[test]
fn array_keys_are_unhashable() {
    let err = eval_err(vec![expr_stmt(hash(vec![(array(vec![]), int(1))]))]);
    assert_eq!(err.message, "key error: unusable as hash key: ARRAY");
}

#[test]
fn range_bounds_must_be_integers() {
    let err = eval_err(vec![expr_stmt(range(int(1), float(2.0)))]);
    assert_eq!(err.message, "range bounds must be INTEGER, got INTEGER and FLOAT");
}

// Bindings

#[test]
fn let_binds_pairwise() {
    let result = eval_ok(vec![
        let_many(&["a", "b"], vec![int(1), int(2)]),
        expr_stmt(add(infix(InfixOp::Mul, ident("a"), int(10)), ident("b"))),
    ]);
    assert_eq!(result, Value::int(12));
}

#[test]
fn let_destructures_tuple_and_array() {
    let result = eval_ok(vec![
        let_many(&["a", "b"], vec![tuple(vec![int(1), int(2)])]),
        let_many(&["c", "d"], vec![array(vec![int(3), int(4)])]),
        expr_stmt(array(vec![ident("a"), ident("b"), ident("c"), ident("d")])),
    ]);
    assert_eq!(result, ints(&[1, 2, 3, 4]));
}

#[test]
fn let_count_mismatch() {
    let err = eval_err(vec![let_many(&["a", "b"], vec![int(1), int(2), int(3)])]);
    assert_eq!(err.message, "let binds 2 names but got 3 values");

    let err = eval_err(vec![let_many(&["a", "b"], vec![tuple(vec![int(1)])])]);
    assert_eq!(err.message, "let binds 2 names but got 1 values");
}

#[test]
fn let_evaluates_to_nil() {
    assert_eq!(eval_ok(vec![let_("x", int(1))]), Value::nil());
}

#[test]
fn assignment_declares_unknown_names() {
    let result = eval_ok(vec![
        expr_stmt(assign(ident("fresh"), int(3))),
        expr_stmt(ident("fresh")),
    ]);
    assert_eq!(result, Value::int(3));
}

#[test]
fn assignment_updates_enclosing_binding() {
    let result = eval_ok(vec![
        let_("x", int(1)),
        block_stmt(vec![expr_stmt(assign(ident("x"), int(2)))]),
        expr_stmt(ident("x")),
    ]);
    assert_eq!(result, Value::int(2));
}

#[test]
fn assignment_evaluates_to_stored_value() {
    let result = eval_ok(vec![
        let_("x", int(1)),
        expr_stmt(compound(AssignOp::Mul, ident("x"), int(6))),
    ]);
    assert_eq!(result, Value::int(6));
}

#[test]
fn compound_assignment_requires_binding() {
    let err = eval_err(vec![expr_stmt(compound(
        AssignOp::Add,
        ident("undefined_thing"),
        int(1),
    ))]);
    assert!(
        matches!(
            err.kind,
            EvalErrorKind::UnknownIdentifier { .. } | EvalErrorKind::UnknownIdentifierSuggest { .. }
        ),
        "{err}"
    );
}

#[test]
fn string_compound_assignment_concatenates() {
    let result = eval_ok(vec![
        let_("s", string("mag")),
        expr_stmt(compound(AssignOp::Add, ident("s"), string("pie"))),
        expr_stmt(ident("s")),
    ]);
    assert_eq!(result, Value::string("magpie"));
}

#[test]
fn call_is_not_an_assignment_target() {
    let err = eval_err(vec![expr_stmt(assign(call("len", vec![string("a")]), int(1)))]);
    assert_eq!(err.message, "cannot assign to a call");
}

#[test]
fn postfix_returns_previous_value() {
    let result = eval_ok(vec![
        let_("i", int(5)),
        let_("j", postfix(PostfixOp::Increment, ident("i"))),
        let_("k", postfix(PostfixOp::Decrement, ident("j"))),
        expr_stmt(array(vec![ident("i"), ident("j"), ident("k")])),
    ]);
    assert_eq!(result, ints(&[6, 4, 5]));
}

#[test]
fn postfix_on_float_and_element() {
    let result = eval_ok(vec![
        let_("f", float(1.5)),
        expr_stmt(postfix(PostfixOp::Increment, ident("f"))),
        let_("a", array(vec![int(1), int(2)])),
        expr_stmt(postfix(PostfixOp::Increment, index(ident("a"), int(1)))),
        expr_stmt(array(vec![ident("f"), ident("a")])),
    ]);
    assert_eq!(result.display(), "[2.5, [1, 3]]");
}

#[test]
fn postfix_rejects_non_numbers() {
    let err = eval_err(vec![
        let_("s", string("x")),
        expr_stmt(postfix(PostfixOp::Increment, ident("s"))),
    ]);
    assert_eq!(
        err.message,
        "unsupported operator for postfix expression: '++' on STRING"
    );
}

#[test]
fn postfix_overflow() {
    let err = eval_err(vec![
        let_("n", int(i64::MAX)),
        expr_stmt(postfix(PostfixOp::Increment, ident("n"))),
    ]);
    assert_eq!(err.kind, EvalErrorKind::IntegerOverflow { operation: "++" });
}

// Element access

#[test]
fn index_reads_with_negative_indices() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1), int(2), int(3)])),
        expr_stmt(array(vec![
            index(ident("a"), int(-1)),
            index(string("magpie"), int(0)),
            index(range(int(10), int(20)), int(2)),
            index(tuple(vec![int(7), int(8)]), int(1)),
        ])),
    ]);
    assert_eq!(result.display(), "[3, \"m\", 12, 8]");
}

#[test]
fn index_out_of_range() {
    let err = eval_err(vec![
        let_("a", array(vec![int(1), int(2), int(3)])),
        expr_stmt(index(ident("a"), int(5))),
    ]);
    assert_eq!(err.message, "index 5 out of range (length 3)");
}

#[test]
fn index_type_mismatch() {
    let err = eval_err(vec![expr_stmt(index(array(vec![]), string("x")))]);
    assert_eq!(err.message, "ARRAY cannot be indexed by STRING");
    let err = eval_err(vec![expr_stmt(index(int(3), int(0)))]);
    assert_eq!(err.message, "INTEGER cannot be indexed by INTEGER");
}

#[test]
fn missing_hash_key_reads_nil() {
    let result = eval_ok(vec![expr_stmt(index(
        hash(vec![(string("a"), int(1))]),
        string("b"),
    ))]);
    assert_eq!(result, Value::nil());
}

#[test]
fn index_assignment_on_array_and_hash() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1), int(2), int(3)])),
        expr_stmt(assign(index(ident("a"), int(-1)), int(9))),
        let_("h", hash(vec![(string("n"), int(1))])),
        expr_stmt(compound(AssignOp::Add, index(ident("h"), string("n")), int(4))),
        expr_stmt(assign(index(ident("h"), string("m")), int(0))),
        expr_stmt(array(vec![ident("a"), ident("h")])),
    ]);
    assert_eq!(result.display(), "[[1, 2, 9], {\"n\" : 5, \"m\" : 0}]");
}

#[test]
fn index_assignment_out_of_range() {
    let err = eval_err(vec![
        let_("a", array(vec![int(1)])),
        expr_stmt(assign(index(ident("a"), int(3)), int(0))),
    ]);
    assert_eq!(err.message, "index 3 out of range (length 1)");
}

#[test]
fn member_access_reads_hash_keys() {
    let program = vec![
        let_("h", hash(vec![(string("name"), string("pie"))])),
        expr_stmt(member(ident("h"), "name")),
    ];
    assert_eq!(eval_ok(program), Value::string("pie"));

    let err = eval_err(vec![
        let_("h", hash(vec![])),
        expr_stmt(member(ident("h"), "name")),
    ]);
    assert_eq!(err.message, "key error: name");
}

#[test]
fn unknown_member_suggests_method() {
    let err = eval_err(vec![expr_stmt(member(array(vec![]), "lenn"))]);
    assert_eq!(err.message, "ARRAY has no member 'lenn', did you mean 'len'?");
}

#[test]
fn slices() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1), int(2), int(3), int(4)])),
        expr_stmt(array(vec![
            slice(ident("a"), Some(int(1)), Some(int(3))),
            slice(ident("a"), None, Some(int(-1))),
            slice(ident("a"), Some(int(2)), None),
            slice(string("magpie"), Some(int(1)), Some(int(3))),
        ])),
    ]);
    assert_eq!(result.display(), "[[2, 3], [1, 2, 3], [3, 4], \"ag\"]");
}

#[test]
fn slice_out_of_range() {
    let err = eval_err(vec![expr_stmt(slice(
        array(vec![int(1)]),
        Some(int(0)),
        Some(int(4)),
    ))]);
    assert_eq!(err.message, "slice [0:4] out of range (length 1)");
}

#[test]
fn ternary_picks_branch() {
    let result = eval_ok(vec![expr_stmt(ternary(
        infix(InfixOp::Gt, int(2), int(1)),
        string("yes"),
        ident("undefined_thing"),
    ))]);
    assert_eq!(result, Value::string("yes"));
}

#[test]
fn membership_and_regex_match() {
    let result = eval_ok(vec![expr_stmt(array(vec![
        infix(InfixOp::In, int(2), array(vec![int(1), int(2)])),
        infix(InfixOp::In, string("pi"), string("magpie")),
        infix(InfixOp::In, int(30), range(int(1), int(10))),
        infix(InfixOp::Match, string("magpie"), string("^mag")),
    ]))]);
    assert_eq!(result.display(), "[true, true, false, true]");
}

// Equality

fn eq(left: Expr, right: Expr) -> Expr {
    infix(InfixOp::Eq, left, right)
}

fn invalid_int() -> Expr {
    method(int(5), "setValid", vec![boolean(false)])
}

#[test]
fn hash_equality_is_display_based_and_deliberately_loose() {
    // Keys and values are compared through their display strings, so an
    // integer and the string holding its digits match.
    let result = eval_ok(vec![expr_stmt(array(vec![
        eq(
            hash(vec![(string("a"), int(1))]),
            hash(vec![(string("a"), string("1"))]),
        ),
        eq(
            hash(vec![(string("a"), int(1))]),
            hash(vec![(string("a"), int(1)), (string("b"), int(2))]),
        ),
    ]))]);
    assert_eq!(result.display(), "[true, false]");
}

#[test]
fn array_equality_is_element_wise() {
    let result = eval_ok(vec![expr_stmt(array(vec![
        eq(array(vec![int(1), string("x")]), array(vec![int(1), string("x")])),
        eq(array(vec![int(1)]), array(vec![string("x")])),
        eq(array(vec![int(1)]), array(vec![int(1), int(2)])),
    ]))]);
    assert_eq!(result.display(), "[true, false, false]");
}

#[test]
fn scalar_equality() {
    let result = eval_ok(vec![expr_stmt(array(vec![
        eq(boolean(true), boolean(true)),
        eq(boolean(true), boolean(false)),
        eq(nil(), nil()),
        eq(int(2), float(2.0)),
    ]))]);
    assert_eq!(result.display(), "[true, false, true, true]");
}

#[test]
fn string_never_equals_number() {
    let err = eval_err(vec![expr_stmt(eq(string("1"), int(1)))]);
    assert!(matches!(err.kind, EvalErrorKind::InfixOpError { op: "==", .. }));
}

#[test]
fn invalid_values_equal_only_nil_or_invalid_of_same_kind() {
    let result = eval_ok(vec![expr_stmt(array(vec![
        eq(invalid_int(), nil()),
        eq(invalid_int(), invalid_int()),
        eq(invalid_int(), int(5)),
        eq(
            invalid_int(),
            method(float(5.0), "setValid", vec![boolean(false)]),
        ),
    ]))]);
    assert_eq!(result.display(), "[true, true, false, false]");
}

#[test]
fn invalid_values_reject_other_operators() {
    for op in [InfixOp::Add, InfixOp::Lt, InfixOp::Mul] {
        let err = eval_err(vec![expr_stmt(infix(op, invalid_int(), int(1)))]);
        assert!(
            matches!(err.kind, EvalErrorKind::InfixOpError { .. }),
            "{op:?}: {err}"
        );
    }
}
