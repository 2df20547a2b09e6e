mod utils;

use expect_test::expect;
use utils::check;
use vio_vm::{RunConfig, Vm};

#[test]
fn addition() {
    check("(+ 2 3)", expect!["5"]);
}

#[test]
fn nested_arithmetic() {
    check("(- (* 4 5) (/ 10 2))", expect!["15"]);
}

#[test]
fn if_chooses_the_consequent() {
    check(r#"(if (> 5 3) "yes" "no")"#, expect![[r#""yes""#]]);
}

#[test]
fn if_chooses_the_alternate() {
    check(r#"(if (> 1 3) "yes" "no")"#, expect![[r#""no""#]]);
}

#[test]
fn if_without_alternate_is_false() {
    check("(if (< 5 3) 1)", expect!["false"]);
}

#[test]
fn while_counts_to_three() {
    check("(var i 0) (while (< i 3) (set i (+ i 1))) i", expect!["3"]);
}

#[test]
fn while_value_is_the_last_body_value() {
    check("(var i 0) (while (< i 3) (set i (+ i 1)))", expect!["3"]);
}

#[test]
fn while_with_a_false_condition_is_false() {
    check("(while false 1)", expect!["false"]);
}

#[test]
fn user_function() {
    check("(def sq (x) (* x x)) (sq 7)", expect!["49"]);
}

#[test]
fn recursive_factorial() {
    check(
        "(def fact (n) (if (== n 1) 1 (* n (fact (- n 1))))) (fact 5)",
        expect!["120"],
    );
}

#[test]
fn zero_argument_function() {
    check("(def answer () 42) (answer)", expect!["42"]);
}

#[test]
fn zero_argument_function_with_block_body() {
    check("(def answer () (begin 42)) (answer)", expect!["42"]);
}

#[test]
fn function_with_block_body_and_locals() {
    check("(def f (x) (begin (var y 10) (+ x y))) (f 5)", expect!["15"]);
}

#[test]
fn lambda_application() {
    check("((lambda (x) (* x x)) 2)", expect!["4"]);
}

#[test]
fn var_bound_lambda() {
    check("(var dbl (lambda (x) (+ x x))) (dbl 21)", expect!["42"]);
}

#[test]
fn string_concatenation() {
    check(r#"(+ "foo" "bar")"#, expect![[r#""foobar""#]]);
}

#[test]
fn string_comparison_is_lexicographic() {
    check(r#"(< "abc" "abd")"#, expect!["true"]);
}

#[test]
fn string_equality_is_by_content() {
    check(r#"(== (+ "a" "b") "ab")"#, expect!["true"]);
}

#[test]
fn native_square() {
    check("(square 6)", expect!["36"]);
}

#[test]
fn preloaded_version() {
    check("VERSION", expect!["1"]);
}

#[test]
fn booleans_are_values() {
    check("(if true false true)", expect!["false"]);
}

// ---------------------------------------------------------------------
// Round-trip and idempotence properties.

#[test]
fn var_then_read() {
    check("(var x 5) x", expect!["5"]);
    check(r#"(var s "hi") s"#, expect![[r#""hi""#]]);
    check("(var b true) b", expect!["true"]);
}

#[test]
fn set_with_identity_leaves_the_value() {
    check("(var x 5) (set x (+ x 0)) x", expect!["5"]);
}

#[test]
fn assignment_is_an_expression() {
    check("(var x 5) (set x 7)", expect!["7"]);
}

#[test]
fn begin_of_one_expression_is_that_expression() {
    check("(begin 42)", expect!["42"]);
}

#[test]
fn nested_blocks_with_locals() {
    check(
        "(begin (var x 5) (begin (var y 6) (+ x y)))",
        expect!["11"],
    );
}

#[test]
fn inner_locals_shadow_outer_ones() {
    check(
        "(begin (var x 1) (begin (var x 2) x))",
        expect!["2"],
    );
}

#[test]
fn repeated_definitions_do_not_grow_the_global_table() {
    let mut vm = Vm::new(RunConfig::default());
    vm.exec("(var n 1) (var n 2) (var n 3) n").unwrap();
    // VERSION, square, n
    assert_eq!(vm.globals().len(), 3);
}

#[test]
fn the_stack_is_empty_after_halt() {
    let sources = [
        "(+ 2 3)",
        "(var i 0) (while (< i 3) (set i (+ i 1))) i",
        "(def fact (n) (if (== n 1) 1 (* n (fact (- n 1))))) (fact 5)",
        "(begin (var x 5) (begin (var y 6) (+ x y)))",
        "((lambda (x) (* x x)) 2)",
    ];
    for source in sources {
        let mut vm = Vm::new(RunConfig::default());
        vm.exec(source).unwrap();
        assert_eq!(vm.stack_len(), 0, "stack not empty after {source}");
    }
}
