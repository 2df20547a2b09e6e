use crate::common::config::{Diagnostic, Process, VmDiagnostic};
use codespan_reporting::diagnostic::Severity;
use std::fmt;

#[derive(Debug, Clone)]
pub enum RuntimeError {
    StackOverflow,
    EmptyStack {
        op: &'static str,
    },
    BadLocalIndex {
        slot: u8,
    },
    GlobalOutOfRange {
        index: usize,
    },
    BadConstIndex {
        index: u8,
    },
    UnknownOpcode {
        byte: u8,
    },
    BadCompareOp {
        op: u8,
    },
    TypeError {
        op: &'static str,
        expected: &'static str,
        found: String,
    },
    NotCallable {
        found: &'static str,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    CallStackUnderflow,
    IpOutOfBounds {
        ip: usize,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::EmptyStack { op } => write!(f, "{op}(): empty stack"),
            Self::BadLocalIndex { slot } => {
                write!(f, "invalid local variable index: {slot}")
            }
            Self::GlobalOutOfRange { index } => {
                write!(f, "global {index} doesn't exist")
            }
            Self::BadConstIndex { index } => {
                write!(f, "invalid constant index: {index}")
            }
            Self::UnknownOpcode { byte } => write!(f, "unknown opcode: {byte:#04X}"),
            Self::BadCompareOp { op } => write!(f, "invalid comparison operator: {op}"),
            Self::TypeError {
                op,
                expected,
                found,
            } => {
                write!(f, "type error: {op} expects {expected}, found {found}")
            }
            Self::NotCallable { found } => {
                write!(f, "type error: {found} is not callable")
            }
            Self::ArityMismatch {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{name} expects {expected} argument(s) but was called with {found}"
                )
            }
            Self::CallStackUnderflow => write!(f, "return with no active call frame"),
            Self::IpOutOfBounds { ip } => {
                write!(f, "instruction pointer {ip} past the end of code")
            }
        }
    }
}

impl VmDiagnostic for RuntimeError {
    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn to_diagnostic(&self, _process: &Process) -> Diagnostic {
        Diagnostic::error().with_message(self.to_string())
    }
}
