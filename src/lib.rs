#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::match_same_arms,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod common;
pub mod compiler;
pub mod parse;
mod vm;

pub use common::{
    config::{self, Diagnostic, Process, RunConfig, VmDiagnostic},
    Interner, Key, List,
};
pub use compiler::{CompileError, CompiledProgram, Compiler};
pub use vm::{
    disassemble, disassemble_instruction, render_value, CodeObject, Collector, FunctionObject,
    GlobalVar, Globals, Handle, Heap, LocalVar, NativeFn, NativeObject, Object, Opcode,
    RuntimeError, Value, ValueStack, Vm,
};

use codespan_reporting::diagnostic::Severity;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of the pipeline. All of them are fatal: the CLI prints
/// `Fatal error: <message>` and exits.
#[derive(Debug)]
pub enum Error {
    Parse(parse::ParseError),
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => err.fmt(f),
            Self::Compile(err) => err.fmt(f),
            Self::Runtime(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<parse::ParseError> for Error {
    fn from(err: parse::ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}

impl VmDiagnostic for Error {
    fn severity(&self) -> Severity {
        match self {
            Self::Parse(err) => err.severity(),
            Self::Compile(err) => err.severity(),
            Self::Runtime(err) => err.severity(),
        }
    }

    fn to_diagnostic(&self, process: &Process) -> Diagnostic {
        match self {
            Self::Parse(err) => err.to_diagnostic(process),
            Self::Compile(err) => err.to_diagnostic(process),
            Self::Runtime(err) => err.to_diagnostic(process),
        }
    }
}
