//! Error types for compile orchestration

use std::path::PathBuf;

use sdfl_lang::Diagnostic;
use thiserror::Error;

/// Result type alias using the engine's error type
pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Syntax(#[from] sdfl_lang::Error),

    #[error(transparent)]
    Sequence(#[from] sdfl_seq::SequenceError),

    #[error(transparent)]
    Generate(#[from] sdfl_glsl::GenerateError),

    #[error("invalid submission: {0}")]
    Submission(String),

    #[error("invalid preview image: {0}")]
    Preview(#[from] base64::DecodeError),

    #[error("failed to serialize submission: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Diagnostics behind a syntax failure
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Syntax(error) => error.diagnostics(),
            _ => &[],
        }
    }
}
