use magpie_ir::Position;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn display_carries_line_prefix() {
    let err = divide_by_zero(Position::line(7));
    assert_eq!(err.to_string(), "line 7: divide by zero");
    assert_eq!(err.message, "divide by zero");
    assert_eq!(err.line_prefix(), "line 7: ");
}

#[test]
fn unknown_position_has_no_prefix() {
    let err = channel_closed(Position::UNKNOWN);
    assert_eq!(err.to_string(), "send on closed channel");
}

#[test]
fn suggestion_variants() {
    let plain = unknown_identifier(Position::line(1), "cnt", None);
    assert_eq!(plain.message, "unknown identifier: 'cnt' is not defined");

    let suggested = unknown_identifier(Position::line(1), "cnt", Some("count"));
    assert_eq!(
        suggested.message,
        "unknown identifier: 'cnt' is not defined, did you mean 'count'?"
    );

    let method = no_method(Position::line(2), "lenght", "STRING", Some("len"));
    assert_eq!(
        method.to_string(),
        "line 2: no method 'lenght' for STRING, did you mean 'len'?"
    );
}

#[test]
fn throw_message_is_verbatim() {
    let err = unhandled_throw(Position::line(3), "boom");
    assert!(err.is_throw());
    assert_eq!(err.message, "boom");
    assert_eq!(err.to_string(), "line 3: boom");
    assert!(!divide_by_zero(Position::line(3)).is_throw());
}

#[test]
fn infix_message_names_both_kinds() {
    let err = infix_op_error(Position::line(9), "INTEGER", "-", "STRING");
    assert_eq!(
        err.message,
        "unsupported operator for infix expression: INTEGER - STRING"
    );
}

#[test]
fn argument_count_renders_expected_as_written() {
    let err = argument_count(Position::UNKNOWN, "add", "at least 1", 0);
    assert_eq!(
        err.message,
        "wrong number of arguments to 'add': expected at least 1, got 0"
    );
}

#[test]
fn regex_error_keeps_pattern() {
    let bad = regex::Regex::new("(").unwrap_err();
    let err = regex_error(Position::line(1), "(", &bad);
    assert!(err.message.starts_with("invalid regular expression '(': "));
}

#[test]
fn control_action_wraps_errors() {
    let action: ControlAction = key_error(Position::UNKNOWN, "missing").into();
    assert_eq!(action.as_error().map(|e| e.message.as_str()), Some("key error: missing"));
    let err = action.into_error().unwrap();
    assert_eq!(err.kind, EvalErrorKind::KeyError { key: "missing".into() });

    assert!(ControlAction::Break.as_error().is_none());
    assert!(ControlAction::Return(Value::int(1)).into_error().is_none());
}
