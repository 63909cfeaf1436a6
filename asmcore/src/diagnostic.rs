//! Diagnostics are accumulated, not thrown: every fallible step in the
//! driver returns an `Option`/pushes into a `Vec<Diagnostic>` rather than
//! short-circuiting, so a single run can surface every error it finds. Only
//! I/O failures (`driver::Error::Io`) abort immediately.

use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DiagnosticKind {
    Lexical(String),
    Syntactic(String),
    SemanticSymbol(String),
    Encoding(isa::error::EncodeError),
    Arithmetic(isa::error::EncodeError),
    UnknownDirective(String),
    UnimplementedCfi(String),
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::Lexical(msg) => write!(f, "{}", msg),
            DiagnosticKind::Syntactic(msg) => write!(f, "{}", msg),
            DiagnosticKind::SemanticSymbol(msg) => write!(f, "{}", msg),
            DiagnosticKind::Encoding(err) => write!(f, "{}", err),
            DiagnosticKind::Arithmetic(err) => write!(f, "{}", err),
            DiagnosticKind::UnknownDirective(name) => write!(f, "unknown directive \"{}\"", name),
            DiagnosticKind::UnimplementedCfi(name) => {
                write!(f, "recognised but unimplemented CFI directive \"{}\"", name)
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: PathBuf,
    pub line: u32,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn error(file: PathBuf, line: u32, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            file,
            line,
            kind,
        }
    }

    pub fn warning(file: PathBuf, line: u32, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            file,
            line,
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}:{}: {}: {}",
            self.file.display(),
            self.line,
            label,
            self.kind
        )
    }
}

/// Collects diagnostics over a run; the exit code is non-zero iff
/// `error_count() > 0` once the run finishes.
#[derive(Default, Debug)]
pub struct DiagnosticBag {
    pub items: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> DiagnosticBag {
        DiagnosticBag::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}
