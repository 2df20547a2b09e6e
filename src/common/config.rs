use codespan_reporting::diagnostic::Severity;
use codespan_reporting::files::SimpleFile;

/// Value-stack capacity; pushing past it is fatal.
pub const STACK_LIMIT: usize = 512;

/// Allocated-byte threshold at which `maybe_gc` triggers a collection.
pub const GC_THRESHOLD: usize = 1024;

pub type File<'a> = SimpleFile<&'a str, &'a str>;
pub type Diagnostic = codespan_reporting::diagnostic::Diagnostic<()>;

#[derive(Debug, Clone)]
pub struct Process<'a> {
    file: File<'a>,
    pub config: RunConfig,
}

impl<'a> Process<'a> {
    #[must_use]
    pub fn new(source: &'a str, name: &'a str, config: RunConfig) -> Self {
        Self {
            file: SimpleFile::new(name, source),
            config,
        }
    }

    #[must_use]
    pub fn source(&self) -> &'a str {
        *self.file.source()
    }

    #[must_use]
    pub fn file(&self) -> &File<'a> {
        &self.file
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct RunConfig {
    pub dump_bytecode: bool,
    pub trace_execution: bool,
}

pub trait VmDiagnostic {
    fn severity(&self) -> Severity;

    fn to_diagnostic(&self, process: &Process) -> Diagnostic;
}
