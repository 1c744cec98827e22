//! One line of a flat sequence
//!
//! Fields are colon separated. `literal:` is special: everything after the
//! first colon is the literal text, so tuple literals may contain any
//! character.

use std::fmt;
use std::str::FromStr;

use sdfl_lang::BinaryOperator;

use crate::error::InstructionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceInstruction {
    /// `call:<id>:<arity>`
    Call { identifier: String, arity: usize },
    /// `fundef:<id>:<arity>`
    FunDef { identifier: String, arity: usize },
    /// `arg:<name>`
    Arg(String),
    /// `val:number`
    ValNumber,
    /// `val:tuple`
    ValTuple,
    /// `val:arr:begin[:<count>]`
    ValArrayBegin(Option<usize>),
    /// `val:arr:end`
    ValArrayEnd,
    /// `val:binopt:<op>`
    ValBinaryTerm(BinaryOperator),
    /// `val:binopf:<op>`
    ValBinaryFactor(BinaryOperator),
    /// `literal:<text>`
    Literal(String),
    Left,
    Right,
    /// `param:<name>`
    ParamName(String),
    /// `fundef:end`
    FunDefEnd,
    ParenOpen,
    ParenClose,
}

impl SequenceInstruction {
    /// Short name used in decode errors
    pub fn name(&self) -> &'static str {
        match self {
            SequenceInstruction::Call { .. } => "call",
            SequenceInstruction::FunDef { .. } => "fundef",
            SequenceInstruction::Arg(_) => "arg",
            SequenceInstruction::ValNumber => "val:number",
            SequenceInstruction::ValTuple => "val:tuple",
            SequenceInstruction::ValArrayBegin(_) => "val:arr:begin",
            SequenceInstruction::ValArrayEnd => "val:arr:end",
            SequenceInstruction::ValBinaryTerm(_) => "val:binopt",
            SequenceInstruction::ValBinaryFactor(_) => "val:binopf",
            SequenceInstruction::Literal(_) => "literal",
            SequenceInstruction::Left => "left",
            SequenceInstruction::Right => "right",
            SequenceInstruction::ParamName(_) => "param",
            SequenceInstruction::FunDefEnd => "fundef:end",
            SequenceInstruction::ParenOpen => "paren:open",
            SequenceInstruction::ParenClose => "paren:close",
        }
    }
}

fn malformed(text: &str, reason: &'static str) -> InstructionError {
    InstructionError::Malformed {
        text: text.to_string(),
        reason,
    }
}

fn identifier(text: &str, field: &str) -> Result<String, InstructionError> {
    if field.is_empty() {
        return Err(malformed(text, "empty identifier"));
    }
    Ok(field.to_string())
}

fn count(text: &str, field: &str) -> Result<usize, InstructionError> {
    field
        .parse()
        .map_err(|_| malformed(text, "count is not a non-negative integer"))
}

fn operator(text: &str, field: &str) -> Result<BinaryOperator, InstructionError> {
    BinaryOperator::from_symbol(field).ok_or_else(|| malformed(text, "unknown operator"))
}

impl FromStr for SequenceInstruction {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim_end_matches(['\r', '\n']);
        if let Some(literal) = text.strip_prefix("literal:") {
            return Ok(SequenceInstruction::Literal(literal.to_string()));
        }

        let fields: Vec<&str> = text.split(':').collect();
        let instruction = match fields.as_slice() {
            ["call", id, arity] => SequenceInstruction::Call {
                identifier: identifier(text, id)?,
                arity: count(text, arity)?,
            },
            ["fundef", "end"] => SequenceInstruction::FunDefEnd,
            ["fundef", id, arity] => SequenceInstruction::FunDef {
                identifier: identifier(text, id)?,
                arity: count(text, arity)?,
            },
            ["arg", name] => SequenceInstruction::Arg(identifier(text, name)?),
            ["param", name] => SequenceInstruction::ParamName(identifier(text, name)?),
            ["val", "number"] => SequenceInstruction::ValNumber,
            ["val", "tuple"] => SequenceInstruction::ValTuple,
            ["val", "arr", "begin"] => SequenceInstruction::ValArrayBegin(None),
            ["val", "arr", "begin", n] => SequenceInstruction::ValArrayBegin(Some(count(text, n)?)),
            ["val", "arr", "end"] => SequenceInstruction::ValArrayEnd,
            ["val", "binopt", op] => SequenceInstruction::ValBinaryTerm(operator(text, op)?),
            ["val", "binopf", op] => SequenceInstruction::ValBinaryFactor(operator(text, op)?),
            ["left"] => SequenceInstruction::Left,
            ["right"] => SequenceInstruction::Right,
            ["paren", "open"] => SequenceInstruction::ParenOpen,
            ["paren", "close"] => SequenceInstruction::ParenClose,
            ["call" | "fundef" | "arg" | "param" | "val" | "paren", ..] => {
                return Err(malformed(text, "wrong number of fields"));
            }
            _ => return Err(InstructionError::Unknown(text.to_string())),
        };
        Ok(instruction)
    }
}

impl fmt::Display for SequenceInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceInstruction::Call { identifier, arity } => {
                write!(f, "call:{}:{}", identifier, arity)
            }
            SequenceInstruction::FunDef { identifier, arity } => {
                write!(f, "fundef:{}:{}", identifier, arity)
            }
            SequenceInstruction::Arg(name) => write!(f, "arg:{}", name),
            SequenceInstruction::ValNumber => f.write_str("val:number"),
            SequenceInstruction::ValTuple => f.write_str("val:tuple"),
            SequenceInstruction::ValArrayBegin(Some(n)) => write!(f, "val:arr:begin:{}", n),
            SequenceInstruction::ValArrayBegin(None) => f.write_str("val:arr:begin"),
            SequenceInstruction::ValArrayEnd => f.write_str("val:arr:end"),
            SequenceInstruction::ValBinaryTerm(op) => write!(f, "val:binopt:{}", op.symbol()),
            SequenceInstruction::ValBinaryFactor(op) => write!(f, "val:binopf:{}", op.symbol()),
            SequenceInstruction::Literal(text) => write!(f, "literal:{}", text),
            SequenceInstruction::Left => f.write_str("left"),
            SequenceInstruction::Right => f.write_str("right"),
            SequenceInstruction::ParamName(name) => write!(f, "param:{}", name),
            SequenceInstruction::FunDefEnd => f.write_str("fundef:end"),
            SequenceInstruction::ParenOpen => f.write_str("paren:open"),
            SequenceInstruction::ParenClose => f.write_str("paren:close"),
        }
    }
}
