//! Error types for the SDFL front end

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Result type alias using the front end's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a source file from becoming a trusted AST
#[derive(Error, Debug)]
pub enum Error {
    /// The parser reported at least one syntax error
    #[error("parsing failed with {} syntax error(s): {}", .0.len(), first_message(.0))]
    Syntax(Vec<Diagnostic>),
}

impl Error {
    /// The diagnostics that caused this error
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Syntax(diagnostics) => diagnostics,
        }
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map_or_else(|| "no details".to_string(), |d| d.to_string())
}
