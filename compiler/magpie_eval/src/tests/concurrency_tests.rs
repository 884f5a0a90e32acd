//! `spawn`, channels and the `sync` primitives.

use magpie_ir::ast::build::*;
use magpie_ir::{AssignOp, Expr, InfixOp, PostfixOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::EvalErrorKind;

fn call_on(receiver: &str, name: &str, args: Vec<Expr>) -> Stmt {
    expr_stmt(method(ident(receiver), name, args))
}

#[test]
fn spawned_workers_report_through_channel() {
    let result = eval_ok(vec![
        let_("wg", method(ident("sync"), "WaitGroup", vec![])),
        let_("ch", call("chan", vec![int(3)])),
        fn_decl(
            "worker",
            &["n"],
            vec![
                defer(method(ident("wg"), "done", vec![])),
                call_on("ch", "send", vec![infix(InfixOp::Mul, ident("n"), int(2))]),
            ],
        ),
        call_on("wg", "add", vec![int(3)]),
        spawn(call("worker", vec![int(1)])),
        spawn(call("worker", vec![int(2)])),
        spawn(call("worker", vec![int(3)])),
        call_on("wg", "wait", vec![]),
        call_on("ch", "close", vec![]),
        let_("sum", int(0)),
        expr_stmt(for_in(
            "v",
            ident("ch"),
            vec![expr_stmt(compound(AssignOp::Add, ident("sum"), ident("v")))],
        )),
        expr_stmt(ident("sum")),
    ]);
    assert_eq!(result, Value::int(12));
}

#[test]
fn mutex_serializes_updates() {
    let bump = fn_decl(
        "bump",
        &[],
        vec![
            defer(method(ident("wg"), "done", vec![])),
            expr_stmt(for_c(
                Some(let_("i", int(0))),
                Some(infix(InfixOp::Lt, ident("i"), int(10))),
                Some(postfix(PostfixOp::Increment, ident("i"))),
                vec![
                    call_on("m", "lock", vec![]),
                    expr_stmt(compound(AssignOp::Add, ident("count"), int(1))),
                    call_on("m", "unlock", vec![]),
                ],
            )),
        ],
    );
    let result = eval_ok(vec![
        let_("m", method(ident("sync"), "Mutex", vec![])),
        let_("wg", method(ident("sync"), "WaitGroup", vec![])),
        let_("count", int(0)),
        bump,
        call_on("wg", "add", vec![int(2)]),
        spawn(call("bump", vec![])),
        spawn(call("bump", vec![])),
        call_on("wg", "wait", vec![]),
        expr_stmt(ident("count")),
    ]);
    assert_eq!(result, Value::int(20));
}

#[test]
fn spawn_requires_call() {
    let err = eval_err(vec![spawn(int(1))]);
    assert_eq!(err.kind, EvalErrorKind::SpawnTargetError);
}

#[test]
fn spawned_failure_does_not_reach_spawner() {
    let result = eval_ok(vec![
        let_("done", call("chan", vec![])),
        fn_decl(
            "fail",
            &[],
            vec![
                defer(method(ident("done"), "send", vec![boolean(true)])),
                throw(string("task failed")),
            ],
        ),
        spawn(call("fail", vec![])),
        expr_stmt(method(ident("done"), "recv", vec![])),
    ]);
    assert_eq!(result, Value::boolean(true));
}

#[test]
fn send_on_closed_channel() {
    let err = eval_err(vec![
        let_("ch", call("chan", vec![int(1)])),
        call_on("ch", "close", vec![]),
        call_on("ch", "send", vec![int(1)]),
    ]);
    assert_eq!(err.kind, EvalErrorKind::ChannelClosed);
}

#[test]
fn recv_after_close_drains_then_yields_nil() {
    let result = eval_ok(vec![
        let_("ch", call("chan", vec![int(2)])),
        call_on("ch", "send", vec![int(7)]),
        call_on("ch", "close", vec![]),
        expr_stmt(array(vec![
            method(ident("ch"), "recv", vec![]),
            method(ident("ch"), "recv", vec![]),
        ])),
    ]);
    assert_eq!(result.display(), "[7, nil]");
}

#[test]
fn unbuffered_channel_hands_off_between_tasks() {
    let result = eval_ok(vec![
        let_("ch", call("chan", vec![])),
        spawn(method(ident("ch"), "send", vec![int(42)])),
        expr_stmt(method(ident("ch"), "recv", vec![])),
    ]);
    assert_eq!(result, Value::int(42));
}

#[test]
fn unlock_of_unlocked_mutex() {
    let err = eval_err(vec![
        let_("m", method(ident("sync"), "Mutex", vec![])),
        call_on("m", "unlock", vec![]),
    ]);
    assert_eq!(err.message, "MUTEX: unlock of unlocked lock");
}

#[test]
fn try_lock_reports_availability() {
    let result = eval_ok(vec![
        let_("m", method(ident("sync"), "Mutex", vec![])),
        expr_stmt(array(vec![
            method(ident("m"), "tryLock", vec![]),
            method(ident("m"), "tryLock", vec![]),
        ])),
    ]);
    assert_eq!(result.display(), "[true, false]");
}

#[test]
fn wait_group_counter_cannot_go_negative() {
    let err = eval_err(vec![
        let_("wg", method(ident("sync"), "WaitGroup", vec![])),
        call_on("wg", "done", vec![]),
    ]);
    assert_eq!(err.kind, EvalErrorKind::WaitGroupNegative);
}
