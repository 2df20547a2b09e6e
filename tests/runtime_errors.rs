mod utils;

use expect_test::expect;
use utils::check;

#[test]
fn reference_error_on_read() {
    check("(+ x 1)", expect!["Fatal error: Reference error: x"]);
}

#[test]
fn reference_error_on_assignment() {
    check("(set y 1)", expect!["Fatal error: Reference error: y"]);
}

#[test]
fn parse_error_reports_the_open_paren() {
    check("(+ 1 2", expect!["Fatal error: parse error at 0..1: unclosed list"]);
}

#[test]
fn parse_error_on_stray_close_paren() {
    check(") 1", expect!["Fatal error: parse error at 0..1: unexpected `)`"]);
}

#[test]
fn empty_program_has_no_result() {
    check("", expect!["Fatal error: pop(): empty stack"]);
}

#[test]
fn mixed_addition_is_a_type_error() {
    check(
        r#"(+ 1 "a")"#,
        expect![
            "Fatal error: type error: + expects two numbers or two strings, found number and string"
        ],
    );
}

#[test]
fn subtraction_requires_numbers() {
    check(
        r#"(- "a" "b")"#,
        expect!["Fatal error: type error: - expects two numbers, found string and string"],
    );
}

#[test]
fn comparison_requires_matching_kinds() {
    check(
        r#"(< 1 "a")"#,
        expect![
            "Fatal error: type error: comparison expects two numbers or two strings, found number and string"
        ],
    );
}

#[test]
fn condition_must_be_a_boolean() {
    check(
        "(if 1 2 3)",
        expect!["Fatal error: type error: if expects a boolean condition, found number"],
    );
}

#[test]
fn numbers_are_not_callable() {
    check("(1 2)", expect!["Fatal error: type error: number is not callable"]);
}

#[test]
fn wrong_argument_count_is_fatal() {
    check(
        "(def f (x) x) (f 1 2)",
        expect!["Fatal error: f expects 1 argument(s) but was called with 2"],
    );
}

#[test]
fn native_argument_kind_is_checked() {
    check(
        r#"(square "a")"#,
        expect!["Fatal error: type error: square expects a number, found string"],
    );
}

#[test]
fn runaway_recursion_overflows_the_stack() {
    check(
        "(def inf (n) (inf (+ n 1))) (inf 0)",
        expect!["Fatal error: stack overflow"],
    );
}
