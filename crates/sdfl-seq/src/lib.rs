//! SDFL sequence codec
//!
//! Maps a [`Program`](sdfl_lang::Program) to a flat, line-oriented instruction
//! sequence and back. The sequence is what external tooling produces and
//! consumes; a decoded sequence can be fed straight into the GLSL generator.
//!
//! ```text
//! call:sphere:2
//! arg:position
//! val:tuple
//! literal:(0, 0, 0)
//! arg:radius
//! val:number
//! literal:1.0
//! ```
//!
//! Round trips are exact up to two canonicalizations: call arguments come
//! back sorted by name, and parenthesis markers do not survive decoding.

mod decode;
mod encode;
mod error;
mod instruction;

pub use decode::{
    MAX_DEPTH, decode, decode_documents, decode_instructions, decode_str, parse_lines,
    split_documents,
};
pub use encode::{encode, encode_documents, encode_lines, encode_to_string};
pub use error::{InstructionError, Result, SequenceError};
pub use instruction::SequenceInstruction;
