//! Error types for the sequence codec

use thiserror::Error;

/// Result type alias using the codec's error type
pub type Result<T> = std::result::Result<T, SequenceError>;

/// A single line that is not a valid instruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    #[error("unknown instruction `{0}`")]
    Unknown(String),

    #[error("malformed instruction `{text}`: {reason}")]
    Malformed { text: String, reason: &'static str },
}

/// Structural decode/encode failures. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("line {line}: {source}")]
    Instruction {
        line: usize,
        #[source]
        source: InstructionError,
    },

    #[error("unexpected end of sequence, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("line {line}: expected {expected} but found `{found}`")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: array declares {declared} element(s) but holds {found}")]
    ArrayArity {
        line: usize,
        declared: usize,
        found: usize,
    },

    #[error("line {line}: tuple has {count} component(s), expected 1 to 3")]
    TupleArity { line: usize, count: usize },

    #[error("line {line}: operator `{operator}` does not belong in `{instruction}`")]
    OperatorMismatch {
        line: usize,
        operator: String,
        instruction: String,
    },

    #[error("line {line}: argument `{name}` appears more than once")]
    DuplicateArgument { line: usize, name: String },

    #[error("line {line}: `{text}` is not a number literal")]
    InvalidLiteral { line: usize, text: String },

    #[error("line {line}: `{name}` is not an identifier")]
    InvalidIdentifier { line: usize, name: String },

    #[error("line {line}: expression nested too deeply")]
    TooDeep { line: usize },

    #[error("line {line}: trailing instruction `{found}` after the root expression")]
    TrailingInstructions { line: usize, found: String },

    #[error("cannot encode {0}")]
    Unencodable(&'static str),

    #[error("document {index}: {source}")]
    Document {
        index: usize,
        #[source]
        source: Box<SequenceError>,
    },
}

impl SequenceError {
    /// Line of the offending instruction, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            SequenceError::Instruction { line, .. }
            | SequenceError::Unexpected { line, .. }
            | SequenceError::ArrayArity { line, .. }
            | SequenceError::TupleArity { line, .. }
            | SequenceError::OperatorMismatch { line, .. }
            | SequenceError::DuplicateArgument { line, .. }
            | SequenceError::InvalidLiteral { line, .. }
            | SequenceError::InvalidIdentifier { line, .. }
            | SequenceError::TooDeep { line }
            | SequenceError::TrailingInstructions { line, .. } => Some(*line),
            SequenceError::Document { source, .. } => source.line(),
            SequenceError::UnexpectedEnd { .. } | SequenceError::Unencodable(_) => None,
        }
    }
}
