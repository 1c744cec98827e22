//! Diagnostic sink shared by the lexer, parser and code generator
//!
//! Every recoverable problem found while compiling is recorded here instead of
//! being printed directly. Pushing a diagnostic also mirrors it to `tracing`,
//! so a CLI that installs a subscriber sees problems as they happen while
//! library callers can still inspect the full list afterwards.

use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Which compiler phase produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lexical,
    Syntax,
    Generation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexical => write!(f, "lexical"),
            Phase::Syntax => write!(f, "syntax"),
            Phase::Generation => write!(f, "generation"),
        }
    }
}

/// Where in the input a diagnostic points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Row/column in the source text (rows start at 1)
    Position { row: usize, col: usize },
    /// Dotted path through the AST, e.g. `scene.children[1].smoothUnion.child2`
    Path(String),
    /// No useful location
    Unknown,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Position { row, col } => write!(f, "{}:{}", row, col),
            Location::Path(path) => write!(f, "{}", path),
            Location::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub phase: Phase,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn error(phase: Phase, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            phase,
            location,
            message: message.into(),
        }
    }

    pub fn warning(phase: Phase, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            phase,
            location,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{} {} at {}: {}",
            self.phase, label, self.location, self.message
        )
    }
}

/// Ordered collection of diagnostics for one compilation
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error => tracing::error!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, phase: Phase, location: Location, message: impl Into<String>) {
        self.push(Diagnostic::error(phase, location, message));
    }

    pub fn warning(&mut self, phase: Phase, location: Location, message: impl Into<String>) {
        self.push(Diagnostic::warning(phase, location, message));
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    /// Whether any error was reported by the given phase
    pub fn has_errors_in(&self, phase: Phase) -> bool {
        self.entries
            .iter()
            .any(|d| d.is_error() && d.phase == phase)
    }

    /// Errors reported by the given phase, in report order
    pub fn errors_in(&self, phase: Phase) -> Vec<Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.is_error() && d.phase == phase)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
