//! AST to sequence
//!
//! Pre-order flattening. Call arguments come out sorted by name because
//! `FunctionCall` stores them in a `BTreeMap`.

use sdfl_lang::{BinaryKind, Expression, FunctionDefinition, Program};

use crate::error::{Result, SequenceError};
use crate::instruction::SequenceInstruction;

/// Flatten a program into instructions
pub fn encode(program: &Program) -> Result<Vec<SequenceInstruction>> {
    let mut out = Vec::new();
    for definition in program.definitions() {
        encode_definition(definition, &mut out)?;
    }
    encode_expression(&program.root, &mut out)?;
    tracing::debug!("Encoded program into {} instructions", out.len());
    Ok(out)
}

/// Flatten a program into text lines
pub fn encode_lines(program: &Program) -> Result<Vec<String>> {
    Ok(encode(program)?.iter().map(ToString::to_string).collect())
}

/// Flatten a program into newline-joined text without a trailing newline
pub fn encode_to_string(program: &Program) -> Result<String> {
    Ok(encode_lines(program)?.join("\n"))
}

/// Encode several programs as one multi-document text, separated by a blank line
pub fn encode_documents(programs: &[Program]) -> Result<String> {
    let documents = programs
        .iter()
        .map(encode_to_string)
        .collect::<Result<Vec<_>>>()?;
    Ok(documents.join("\n\n"))
}

fn encode_definition(
    definition: &FunctionDefinition,
    out: &mut Vec<SequenceInstruction>,
) -> Result<()> {
    out.push(SequenceInstruction::FunDef {
        identifier: definition.identifier.clone(),
        arity: definition.parameters.len(),
    });
    out.extend(
        definition
            .parameters
            .iter()
            .map(|p| SequenceInstruction::ParamName(p.clone())),
    );
    encode_expression(&definition.body, out)?;
    out.push(SequenceInstruction::FunDefEnd);
    Ok(())
}

fn encode_expression(expr: &Expression, out: &mut Vec<SequenceInstruction>) -> Result<()> {
    match expr {
        Expression::Grouped(inner) => {
            out.push(SequenceInstruction::ParenOpen);
            encode_expression(inner, out)?;
            out.push(SequenceInstruction::ParenClose);
        }
        Expression::Call(call) => {
            out.push(SequenceInstruction::Call {
                identifier: call.identifier.clone(),
                arity: call.arguments.len(),
            });
            for (name, value) in &call.arguments {
                out.push(SequenceInstruction::Arg(name.clone()));
                encode_expression(value, out)?;
            }
        }
        Expression::Tuple(values) => {
            out.push(SequenceInstruction::ValTuple);
            out.push(SequenceInstruction::Literal(format!(
                "({})",
                values.join(", ")
            )));
        }
        Expression::Array(items) => {
            out.push(SequenceInstruction::ValArrayBegin(Some(items.len())));
            for item in items {
                encode_expression(item, out)?;
            }
            out.push(SequenceInstruction::ValArrayEnd);
        }
        Expression::Number(value) => {
            out.push(SequenceInstruction::ValNumber);
            out.push(SequenceInstruction::Literal(value.clone()));
        }
        Expression::Binary(binary) => {
            out.push(match binary.operator.kind() {
                BinaryKind::Term => SequenceInstruction::ValBinaryTerm(binary.operator),
                BinaryKind::Factor => SequenceInstruction::ValBinaryFactor(binary.operator),
            });
            out.push(SequenceInstruction::Left);
            encode_expression(&binary.left, out)?;
            out.push(SequenceInstruction::Right);
            encode_expression(&binary.right, out)?;
        }
        Expression::Invalid => {
            return Err(SequenceError::Unencodable("an invalid expression"));
        }
    }
    Ok(())
}
