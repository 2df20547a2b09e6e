use crate::{
    common::config::{Diagnostic, Process, VmDiagnostic},
    parse::TokenKind,
};
use codespan_reporting::diagnostic::{Label, Severity};
use std::fmt;
use text_size::TextRange;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub range: TextRange,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken(TokenKind),
    UnexpectedEof,
    UnclosedList,
    UnknownToken,
    InvalidNumber,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    fn message(&self) -> String {
        match self.kind {
            ParseErrorKind::UnexpectedToken(found) => {
                format!("unexpected {}", found.as_str())
            }
            ParseErrorKind::UnexpectedEof => "unexpected end of input".to_string(),
            ParseErrorKind::UnclosedList => "unclosed list".to_string(),
            ParseErrorKind::UnknownToken => "unrecognized token".to_string(),
            ParseErrorKind::InvalidNumber => "invalid number literal".to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (u32::from(self.range.start()), u32::from(self.range.end()));
        write!(f, "parse error at {start}..{end}: {}", self.message())
    }
}

impl VmDiagnostic for ParseError {
    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn to_diagnostic(&self, _process: &Process) -> Diagnostic {
        let range: std::ops::Range<usize> = self.range.into();
        Diagnostic::error()
            .with_message("parse error")
            .with_labels(vec![Label::primary((), range).with_message(self.message())])
    }
}
