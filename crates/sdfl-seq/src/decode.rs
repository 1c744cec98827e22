//! Sequence to AST
//!
//! Decoding is driven by the arity fields and explicit markers. Unlike the
//! parser there is no recovery: the first structural problem is returned.
//! Parenthesis markers are checked for balance and then dropped, so a decoded
//! program never contains `Expression::Grouped`.

use std::collections::BTreeMap;

use sdfl_lang::{
    BinaryKind, BinaryOperator, CompilationContext, Expression, FunctionCall, FunctionDefinition,
    Program, Statement,
};

use crate::error::{Result, SequenceError};
use crate::instruction::SequenceInstruction;

const MAX_TUPLE_ARITY: usize = 3;
/// Deepest expression nesting accepted before decoding gives up
pub const MAX_DEPTH: usize = 256;

/// Parse text lines into numbered instructions. Blank lines are skipped;
/// numbering follows the input.
pub fn parse_lines<I, S>(lines: I) -> Result<Vec<(usize, SequenceInstruction)>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.as_ref().trim().is_empty())
        .map(|(i, line)| {
            line.as_ref()
                .parse()
                .map(|instruction| (i + 1, instruction))
                .map_err(|source| SequenceError::Instruction { line: i + 1, source })
        })
        .collect()
}

/// Decode text lines into a program, registering its definitions in `ctx`
pub fn decode<I, S>(lines: I, ctx: &mut CompilationContext) -> Result<Program>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let instructions = parse_lines(lines)?;
    decode_instructions(&instructions, ctx)
}

/// Decode newline-separated text
pub fn decode_str(text: &str, ctx: &mut CompilationContext) -> Result<Program> {
    decode(text.lines(), ctx)
}

/// Decode already-parsed instructions
pub fn decode_instructions(
    instructions: &[(usize, SequenceInstruction)],
    ctx: &mut CompilationContext,
) -> Result<Program> {
    let program = Decoder::new(instructions, ctx).program()?;
    tracing::debug!(
        "Decoded {} instructions into {} definition(s) and a root expression",
        instructions.len(),
        program.statements.len()
    );
    Ok(program)
}

/// Split a multi-document text on blank lines
pub fn split_documents(text: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                documents.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        documents.push(current.join("\n"));
    }
    documents
}

/// Decode every document of a multi-document text, each against a fresh
/// context. Callers re-register definitions with
/// [`CompilationContext::register_program`] before generating.
pub fn decode_documents(text: &str) -> Result<Vec<Program>> {
    split_documents(text)
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let mut ctx = CompilationContext::new();
            decode_str(document, &mut ctx).map_err(|source| SequenceError::Document {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

struct Decoder<'i, 'c> {
    instructions: &'i [(usize, SequenceInstruction)],
    pos: usize,
    depth: usize,
    ctx: &'c mut CompilationContext,
}

impl<'i, 'c> Decoder<'i, 'c> {
    fn new(instructions: &'i [(usize, SequenceInstruction)], ctx: &'c mut CompilationContext) -> Self {
        Self {
            instructions,
            pos: 0,
            depth: 0,
            ctx,
        }
    }

    fn peek(&self) -> Option<&'i SequenceInstruction> {
        self.instructions.get(self.pos).map(|(_, i)| i)
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, &'i SequenceInstruction)> {
        let (line, instruction) = self
            .instructions
            .get(self.pos)
            .ok_or(SequenceError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok((*line, instruction))
    }

    fn expect(&mut self, expected: &SequenceInstruction) -> Result<()> {
        let (line, found) = self.next(expected.name())?;
        if found == expected {
            Ok(())
        } else {
            Err(unexpected(line, expected.name(), found))
        }
    }

    fn literal(&mut self) -> Result<(usize, &'i str)> {
        match self.next("literal")? {
            (line, SequenceInstruction::Literal(text)) => Ok((line, text)),
            (line, other) => Err(unexpected(line, "literal", other)),
        }
    }

    fn program(mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while let Some(SequenceInstruction::FunDef { .. }) = self.peek() {
            let definition = self.definition()?;
            self.ctx.register_definition(&definition);
            statements.push(Statement::FunctionDefinition(definition));
        }

        let root = self.expression()?;

        if let Some((line, found)) = self.instructions.get(self.pos) {
            return Err(SequenceError::TrailingInstructions {
                line: *line,
                found: found.to_string(),
            });
        }
        Ok(Program { statements, root })
    }

    fn definition(&mut self) -> Result<FunctionDefinition> {
        let (identifier, arity) = match self.next("fundef")? {
            (line, SequenceInstruction::FunDef { identifier, arity }) => {
                (checked_identifier(line, identifier)?, *arity)
            }
            (line, other) => return Err(unexpected(line, "fundef", other)),
        };

        let mut parameters = Vec::with_capacity(arity);
        for _ in 0..arity {
            match self.next("param")? {
                (line, SequenceInstruction::ParamName(name)) => {
                    parameters.push(checked_identifier(line, name)?)
                }
                (line, other) => return Err(unexpected(line, "param", other)),
            }
        }

        let body = self.expression()?;
        self.expect(&SequenceInstruction::FunDefEnd)?;

        Ok(FunctionDefinition {
            identifier,
            parameters,
            body,
        })
    }

    fn expression(&mut self) -> Result<Expression> {
        let (line, instruction) = self.next("expression")?;
        if self.depth >= MAX_DEPTH {
            return Err(SequenceError::TooDeep { line });
        }
        self.depth += 1;
        let expression = self.expression_from(line, instruction);
        self.depth -= 1;
        expression
    }

    fn expression_from(
        &mut self,
        line: usize,
        instruction: &'i SequenceInstruction,
    ) -> Result<Expression> {
        match instruction {
            SequenceInstruction::ParenOpen => {
                let inner = self.expression()?;
                self.expect(&SequenceInstruction::ParenClose)?;
                Ok(inner)
            }
            SequenceInstruction::Call { identifier, arity } => {
                let identifier = checked_identifier(line, identifier)?;
                self.call(identifier, *arity)
            }
            SequenceInstruction::ValNumber => {
                let (line, text) = self.literal()?;
                Ok(Expression::Number(checked_number(line, text.trim())?))
            }
            SequenceInstruction::ValTuple => self.tuple(),
            SequenceInstruction::ValArrayBegin(declared) => self.array(line, *declared),
            SequenceInstruction::ValBinaryTerm(operator) => {
                self.binary(line, instruction, *operator, BinaryKind::Term)
            }
            SequenceInstruction::ValBinaryFactor(operator) => {
                self.binary(line, instruction, *operator, BinaryKind::Factor)
            }
            other => Err(unexpected(line, "expression", other)),
        }
    }

    fn call(&mut self, identifier: String, arity: usize) -> Result<Expression> {
        let mut arguments = BTreeMap::new();
        for _ in 0..arity {
            let (line, name) = match self.next("arg")? {
                (line, SequenceInstruction::Arg(name)) => (line, checked_identifier(line, name)?),
                (line, other) => return Err(unexpected(line, "arg", other)),
            };
            let value = self.expression()?;
            if arguments.contains_key(&name) {
                return Err(SequenceError::DuplicateArgument { line, name });
            }
            arguments.insert(name, value);
        }
        Ok(Expression::Call(FunctionCall {
            identifier,
            arguments,
        }))
    }

    fn tuple(&mut self) -> Result<Expression> {
        let (line, text) = self.literal()?;
        let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
        let values: Vec<String> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|v| v.trim().to_string()).collect()
        };
        if values.is_empty() || values.len() > MAX_TUPLE_ARITY || values.iter().any(String::is_empty) {
            return Err(SequenceError::TupleArity {
                line,
                count: values.len(),
            });
        }
        let values = values
            .into_iter()
            .map(|value| checked_number(line, &value))
            .collect::<Result<_>>()?;
        Ok(Expression::Tuple(values))
    }

    fn array(&mut self, line: usize, declared: Option<usize>) -> Result<Expression> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(SequenceInstruction::ValArrayEnd) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => items.push(self.expression()?),
                None => {
                    return Err(SequenceError::UnexpectedEnd {
                        expected: "val:arr:end",
                    });
                }
            }
        }
        if let Some(declared) = declared {
            if declared != items.len() {
                return Err(SequenceError::ArrayArity {
                    line,
                    declared,
                    found: items.len(),
                });
            }
        }
        Ok(Expression::Array(items))
    }

    fn binary(
        &mut self,
        line: usize,
        instruction: &SequenceInstruction,
        operator: BinaryOperator,
        kind: BinaryKind,
    ) -> Result<Expression> {
        if operator.kind() != kind {
            return Err(SequenceError::OperatorMismatch {
                line,
                operator: operator.symbol().to_string(),
                instruction: instruction.name().to_string(),
            });
        }
        self.expect(&SequenceInstruction::Left)?;
        let left = self.expression()?;
        self.expect(&SequenceInstruction::Right)?;
        let right = self.expression()?;
        Ok(Expression::binary(operator, left, right))
    }
}

fn checked_identifier(line: usize, name: &str) -> Result<String> {
    if sdfl_lang::is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(SequenceError::InvalidIdentifier {
            line,
            name: name.to_string(),
        })
    }
}

fn checked_number(line: usize, text: &str) -> Result<String> {
    if sdfl_lang::is_number_literal(text) {
        Ok(text.to_string())
    } else {
        Err(SequenceError::InvalidLiteral {
            line,
            text: text.to_string(),
        })
    }
}

fn unexpected(line: usize, expected: &'static str, found: &SequenceInstruction) -> SequenceError {
    SequenceError::Unexpected {
        line,
        expected,
        found: found.to_string(),
    }
}
