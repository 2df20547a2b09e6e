use crate::common::config::{Diagnostic, Process, VmDiagnostic};
use codespan_reporting::diagnostic::Severity;
use std::fmt;

#[derive(Debug, Clone)]
pub enum CompileError {
    UndefinedReference { name: String },
    MalformedForm { form: &'static str },
    ExpectedSymbol { form: &'static str },
    EmptyExpression,
    TooManyConstants,
    TooManyLocals,
    TooManyGlobals,
    TooManyArguments,
    CodeTooLarge,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedReference { name } => write!(f, "Reference error: {name}"),
            Self::MalformedForm { form } => write!(f, "malformed ({form} ...) expression"),
            Self::ExpectedSymbol { form } => {
                write!(f, "expected a symbol in ({form} ...) expression")
            }
            Self::EmptyExpression => write!(f, "cannot compile an empty expression"),
            Self::TooManyConstants => {
                write!(f, "too many constants in one code object (limit 256)")
            }
            Self::TooManyLocals => {
                write!(f, "too many local variables in one code object (limit 256)")
            }
            Self::TooManyGlobals => write!(f, "too many global variables (limit 256)"),
            Self::TooManyArguments => write!(f, "too many call arguments (limit 256)"),
            Self::CodeTooLarge => write!(f, "code object exceeds the 64 KiB jump range"),
        }
    }
}

impl VmDiagnostic for CompileError {
    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn to_diagnostic(&self, _process: &Process) -> Diagnostic {
        Diagnostic::error().with_message(self.to_string())
    }
}
