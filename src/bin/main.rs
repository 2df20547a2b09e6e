use clap::{CommandFactory, Parser};
use codespan_reporting::term::{
    self,
    termcolor::{ColorChoice, StandardStream},
};
use vio_vm::{Process, RunConfig, Vm, VmDiagnostic};

#[derive(Parser)]
#[clap(name = "vio-vm", about = "Violang bytecode virtual machine")]
struct Cli {
    /// Expression to execute
    #[clap(short = 'e', long = "expression", value_parser)]
    expression: Option<String>,
    /// File to execute
    #[clap(short = 'f', long = "file", value_parser)]
    file: Option<String>,
}

fn main() {
    // absent or unknown arguments print the help banner and exit 0
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(_) => {
            print_banner();
            return;
        }
    };
    let config = RunConfig::default();

    let (name, program) = if let Some(expression) = args.expression {
        ("<expression>".to_string(), expression)
    } else if let Some(path) = args.file {
        let program = read_program(&path);
        (path, program)
    } else {
        print_banner();
        return;
    };

    let process = Process::new(&program, &name, config);
    let mut vm = Vm::new(config);
    match vm.exec(process.source()) {
        Ok(value) => println!("result = {}", vm.render(value)),
        Err(err) => fatal(&err, &process),
    }
}

fn print_banner() {
    let _ = Cli::command().print_help();
    println!();
}

/// A missing file runs as an empty program.
fn read_program(path: &str) -> String {
    let mut program = std::fs::read_to_string(path).unwrap_or_default();
    program.push('\n');
    program
}

fn fatal(err: &vio_vm::Error, process: &Process) -> ! {
    eprintln!("Fatal error: {err}");

    let diagnostic = err.to_diagnostic(process);
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let term_config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &term_config, process.file(), &diagnostic);

    std::process::exit(1);
}
