//! Error types for GLSL generation

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the generator's error type
pub type Result<T> = std::result::Result<T, GenerateError>;

#[derive(Error, Debug)]
pub enum GenerateError {
    /// The root `scene(...)` call is malformed; nothing past the library was emitted
    #[error("invalid scene at {path}: {reason}")]
    InvalidScene { path: String, reason: String },

    #[error("failed to read generator options from {}: {source}", path.display())]
    ReadOptions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid generator options: {0}")]
    ParseOptions(#[from] serde_json::Error),
}
