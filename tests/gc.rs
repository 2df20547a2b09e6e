mod utils;

use expect_test::expect;
use utils::check;
use vio_vm::{RunConfig, Vm};

#[test]
fn concatenation_allocates_a_fresh_string() {
    let mut vm = Vm::new(RunConfig::default());
    let result = vm.exec(r#"(+ "foo" "bar")"#).unwrap();
    assert_eq!(vm.render(result), "\"foobar\"");

    // square native, main code, main function, "foo", "bar", "foobar":
    // the operand constants stay alive as compiler constant roots
    assert_eq!(vm.heap().object_count(), 6);
}

#[test]
fn a_string_building_loop_does_not_retain_garbage() {
    let source = r#"
        (var s "x")
        (var i 0)
        (while (< i 50)
            (begin
                (set s (+ s "yz"))
                (set i (+ i 1))))
        s
    "#;

    let mut vm = Vm::new(RunConfig::default());
    let result = vm.exec(source).unwrap();

    // "x" plus fifty "yz", in quotes
    assert_eq!(vm.render(result).len(), 103);

    // the loop allocated fifty intermediate strings; collection must have
    // reclaimed all but the live tail
    assert!(
        vm.heap().object_count() < 30,
        "heap retains {} objects",
        vm.heap().object_count()
    );
    assert!(vm.heap().bytes_allocated() < 4096);
}

#[test]
fn collection_does_not_disturb_results() {
    check(
        r#"
        (var s "")
        (var i 0)
        (while (< i 40)
            (begin
                (set s (+ s "ab"))
                (set i (+ i 1))))
        (== s (+ s ""))
        "#,
        expect!["true"],
    );
}
