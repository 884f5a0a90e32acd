//! Built-in methods through the interpreter, structs, enums and host
//! objects.

use magpie_ir::ast::build::*;
use magpie_ir::{AssignOp, InfixOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::EvalErrorKind;

fn point() -> Stmt {
    let_(
        "p",
        struct_(vec![
            let_("x", int(1)),
            let_("y", int(2)),
            fn_decl(
                "sum",
                &[],
                vec![ret(infix(InfixOp::Add, ident("x"), ident("y")))],
            ),
        ]),
    )
}

// Methods

#[test]
fn array_methods_chain() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(3), int(1), int(2)])),
        expr_stmt(method(
            method(method(ident("a"), "sort", vec![]), "reverse", vec![]),
            "join",
            vec![string("-")],
        )),
    ]);
    assert_eq!(result, Value::string("3-2-1"));
}

#[test]
fn sort_and_reverse_leave_receiver_alone() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(3), int(1), int(2)])),
        expr_stmt(method(ident("a"), "sort", vec![])),
        expr_stmt(method(ident("a"), "reverse", vec![])),
        expr_stmt(ident("a")),
    ]);
    assert_eq!(result, ints(&[3, 1, 2]));
}

#[test]
fn push_then_pop_restores_array() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1)])),
        expr_stmt(method(ident("a"), "push", vec![int(2)])),
        let_("popped", method(ident("a"), "pop", vec![])),
        expr_stmt(array(vec![ident("popped"), ident("a")])),
    ]);
    assert_eq!(result.display(), "[2, [1]]");
}

#[test]
fn filter_and_reduce_with_callbacks() {
    let result = eval_ok(vec![
        let_("a", array(vec![int(1), int(2), int(3), int(4)])),
        let_(
            "evens",
            method(
                ident("a"),
                "filter",
                vec![func(
                    &["n"],
                    vec![ret(infix(
                        InfixOp::Eq,
                        infix(InfixOp::Mod, ident("n"), int(2)),
                        int(0),
                    ))],
                )],
            ),
        ),
        expr_stmt(method(
            ident("evens"),
            "reduce",
            vec![
                func(&["acc", "n"], vec![ret(infix(InfixOp::Add, ident("acc"), ident("n")))]),
                int(100),
            ],
        )),
    ]);
    assert_eq!(result, Value::int(106));
}

#[test]
fn hash_set_and_delete_keep_order() {
    let result = eval_ok(vec![
        let_("h", hash(vec![])),
        expr_stmt(method(
            method(ident("h"), "set", vec![string("b"), int(1)]),
            "set",
            vec![string("a"), int(2)],
        )),
        expr_stmt(method(ident("h"), "set", vec![string("c"), int(3)])),
        expr_stmt(method(ident("h"), "delete", vec![string("a")])),
        expr_stmt(method(ident("h"), "keys", vec![])),
    ]);
    assert_eq!(result, strs(&["b", "c"]));
}

#[test]
fn hash_get_with_default() {
    let result = eval_ok(vec![
        let_("h", hash(vec![(string("k"), int(1))])),
        expr_stmt(array(vec![
            method(ident("h"), "get", vec![string("k")]),
            method(ident("h"), "get", vec![string("missing"), int(0)]),
            method(ident("h"), "has", vec![string("missing")]),
        ])),
    ]);
    assert_eq!(result.display(), "[1, 0, false]");
}

#[test]
fn string_methods() {
    let result = eval_ok(vec![expr_stmt(array(vec![
        method(string("Magpie"), "upper", vec![]),
        method(string("  pad "), "trim", vec![]),
        method(string("a,b,c"), "split", vec![string(",")]),
        method(string("42"), "int", vec![]),
        method(string("magpie"), "hasPrefix", vec![string("mag")]),
    ]))]);
    assert_eq!(
        result.display(),
        "[\"MAGPIE\", \"pad\", [\"a\", \"b\", \"c\"], 42, true]"
    );
}

#[test]
fn unknown_method_suggests_closest() {
    let err = eval_err(vec![expr_stmt(method(array(vec![]), "pussh", vec![int(1)]))]);
    assert_eq!(err.message, "no method 'pussh' for ARRAY, did you mean 'push'?");
}

#[test]
fn receiver_error_short_circuits_arguments() {
    let (result, output) = eval_output(vec![expr_stmt(method(
        infix(InfixOp::Div, int(1), int(0)),
        "len",
        vec![call("println", vec![string("never")])],
    ))]);
    let err = result.unwrap_err().into_error().unwrap();
    assert_eq!(err.kind, EvalErrorKind::DivideByZero);
    assert_eq!(output, "");
}

#[test]
fn method_argument_type_error() {
    let err = eval_err(vec![expr_stmt(method(
        array(vec![int(1)]),
        "join",
        vec![int(5)],
    ))]);
    assert_eq!(err.message, "argument 1 to 'join' must be STRING, got INTEGER");
}

// Structs

#[test]
fn struct_members_and_methods() {
    let result = eval_ok(vec![
        point(),
        expr_stmt(array(vec![
            member(ident("p"), "x"),
            index(ident("p"), string("y")),
            method(ident("p"), "sum", vec![]),
            call("type", vec![ident("p")]),
        ])),
    ]);
    assert_eq!(result.display(), "[1, 2, 3, \"STRUCT\"]");
}

#[test]
fn struct_member_assignment_is_seen_by_methods() {
    let result = eval_ok(vec![
        point(),
        expr_stmt(assign(member(ident("p"), "x"), int(10))),
        expr_stmt(compound(AssignOp::Add, member(ident("p"), "y"), int(5))),
        expr_stmt(method(ident("p"), "sum", vec![])),
    ]);
    assert_eq!(result, Value::int(17));
}

#[test]
fn struct_rejects_new_members() {
    let mut interp = interpreter();
    let err = interp
        .run(&program(vec![
            point(),
            expr_stmt(assign(member(ident("p"), "z"), int(3))),
        ]))
        .unwrap_err()
        .into_error()
        .unwrap();
    assert!(err.message.starts_with("STRUCT has no member 'z'"), "{err}");
    assert!(interp.current_scope().get("z").is_none());
}

#[test]
fn struct_unknown_member_read_suggests() {
    let err = eval_err(vec![point(), expr_stmt(member(ident("p"), "summ"))]);
    assert_eq!(err.message, "STRUCT has no member 'summ', did you mean 'sum'?");
}

#[test]
fn struct_bindings_do_not_leak() {
    let err = eval_err(vec![point(), expr_stmt(ident("sum"))]);
    assert!(err.message.starts_with("unknown identifier: 'sum'"), "{err}");
}

// Enums

#[test]
fn enum_values_count_up() {
    let result = eval_ok(vec![
        let_(
            "Color",
            enum_(vec![("Red", None), ("Green", Some(int(5))), ("Blue", None)]),
        ),
        expr_stmt(array(vec![
            member(ident("Color"), "Red"),
            member(ident("Color"), "Green"),
            member(ident("Color"), "Blue"),
        ])),
    ]);
    assert_eq!(result, ints(&[0, 5, 6]));
}

#[test]
fn enum_members_are_read_only() {
    let err = eval_err(vec![
        let_("Color", enum_(vec![("Red", None)])),
        expr_stmt(assign(member(ident("Color"), "Red"), int(9))),
    ]);
    assert_eq!(err.message, "enum member 'Red' cannot be reassigned");
}

// Host objects

#[test]
fn registry_constructors_build_host_objects() {
    let result = eval_ok(vec![
        let_("wg", method(ident("sync"), "WaitGroup", vec![])),
        expr_stmt(call("type", vec![ident("wg")])),
    ]);
    assert_eq!(result, Value::string("WAITGROUP"));
}

#[test]
fn host_object_unknown_method() {
    let err = eval_err(vec![
        let_("m", method(ident("sync"), "Mutex", vec![])),
        expr_stmt(method(ident("m"), "lok", vec![])),
    ]);
    assert_eq!(err.message, "no method 'lok' for MUTEX, did you mean 'lock'?");
}
