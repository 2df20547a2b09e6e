use expect_test::Expect;
use vio_vm::{RunConfig, Vm};

pub fn check(source: &str, expected: Expect) {
    expected.assert_eq(&run_to_string(source));
}

pub fn run_to_string(source: &str) -> String {
    let mut vm = Vm::new(RunConfig::default());
    match vm.exec(source) {
        Ok(value) => vm.render(value),
        Err(err) => format!("Fatal error: {err}"),
    }
}
