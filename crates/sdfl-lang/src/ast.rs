//! AST for SDFL programs
//!
//! A program is a list of function definitions followed by exactly one root
//! expression (normally the `scene(...)` call). `Program` implements
//! `Display` as an indented tree for diagnostics.

use std::collections::BTreeMap;
use std::fmt;

/// A parsed (or decoded) SDFL program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub root: Expression,
}

impl Program {
    pub fn new(statements: Vec<Statement>, root: Expression) -> Self {
        Self { statements, root }
    }

    /// Iterate the function definitions in declaration order
    pub fn definitions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.statements.iter().map(|statement| match statement {
            Statement::FunctionDefinition(definition) => definition,
        })
    }
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    FunctionDefinition(FunctionDefinition),
}

/// `def name(params) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub identifier: String,
    pub parameters: Vec<String>,
    pub body: Expression,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal, kept as source text
    Number(String),
    /// Literal tuple such as `(0, 1.5, -2)`
    Tuple(Vec<String>),
    /// `[a, b, c]`
    Array(Vec<Expression>),
    /// `id(name: value, ...)`
    Call(FunctionCall),
    /// `left op right`
    Binary(BinaryOperation),
    /// An expression that was written inside parentheses. Display only.
    Grouped(Box<Expression>),
    /// Placeholder left where a syntax error prevented building an expression
    Invalid,
}

impl Expression {
    pub fn number(value: impl Into<String>) -> Self {
        Expression::Number(value.into())
    }

    pub fn tuple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expression::Tuple(values.into_iter().map(Into::into).collect())
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryOperation {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Strip any parentheses markers
    pub fn ungrouped(&self) -> &Expression {
        let mut expr = self;
        while let Expression::Grouped(inner) = expr {
            expr = inner;
        }
        expr
    }

    pub fn as_call(&self) -> Option<&FunctionCall> {
        match self.ungrouped() {
            Expression::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[String]> {
        match self.ungrouped() {
            Expression::Tuple(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Expression]> {
        match self.ungrouped() {
            Expression::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Expression::Number(_) => "number",
            Expression::Tuple(_) => "tuple",
            Expression::Array(_) => "array",
            Expression::Call(_) => "function call",
            Expression::Binary(_) => "binary operation",
            Expression::Grouped(inner) => inner.describe(),
            Expression::Invalid => "invalid expression",
        }
    }
}

/// A call with named arguments. Argument names are unique and iterate in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCall {
    pub identifier: String,
    pub arguments: BTreeMap<String, Expression>,
}

impl FunctionCall {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: Expression) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Expression> {
        self.arguments.get(name)
    }
}

impl From<FunctionCall> for Expression {
    fn from(call: FunctionCall) -> Self {
        Expression::Call(call)
    }
}

/// Precedence class of a binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// `+`, `-`
    Term,
    /// `*`, `/`
    Factor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOperator::Add),
            "-" => Some(BinaryOperator::Subtract),
            "*" => Some(BinaryOperator::Multiply),
            "/" => Some(BinaryOperator::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    pub fn kind(self) -> BinaryKind {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => BinaryKind::Term,
            BinaryOperator::Multiply | BinaryOperator::Divide => BinaryKind::Factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

// ============================================================================
// Printer
// ============================================================================

const INDENT: &str = "  ";

fn pad(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_expression(f: &mut fmt::Formatter<'_>, expr: &Expression, level: usize) -> fmt::Result {
    pad(f, level)?;
    match expr {
        Expression::Number(value) => writeln!(f, "Number: {}", value),
        Expression::Tuple(values) => {
            writeln!(f, "Tuple:")?;
            for (i, value) in values.iter().enumerate() {
                pad(f, level + 1)?;
                writeln!(f, "[{}] {}", i, value)?;
            }
            Ok(())
        }
        Expression::Array(items) => {
            writeln!(f, "Array:")?;
            for (i, item) in items.iter().enumerate() {
                pad(f, level + 1)?;
                writeln!(f, "[{}]", i)?;
                write_expression(f, item, level + 2)?;
            }
            Ok(())
        }
        Expression::Call(call) => {
            writeln!(f, "FunCall: {}", call.identifier)?;
            if !call.arguments.is_empty() {
                pad(f, level + 1)?;
                writeln!(f, "Arguments:")?;
                for (name, value) in &call.arguments {
                    pad(f, level + 2)?;
                    writeln!(f, "{}:", name)?;
                    write_expression(f, value, level + 3)?;
                }
            }
            Ok(())
        }
        Expression::Binary(binary) => {
            let kind = match binary.operator.kind() {
                BinaryKind::Term => "Term",
                BinaryKind::Factor => "Factor",
            };
            writeln!(f, "BinaryOperation ({}): {}", kind, binary.operator.symbol())?;
            pad(f, level + 1)?;
            writeln!(f, "Left:")?;
            write_expression(f, &binary.left, level + 2)?;
            pad(f, level + 1)?;
            writeln!(f, "Right:")?;
            write_expression(f, &binary.right, level + 2)
        }
        Expression::Grouped(inner) => {
            writeln!(f, "Parenthesized:")?;
            write_expression(f, inner, level + 1)
        }
        Expression::Invalid => writeln!(f, "<invalid>"),
    }
}

fn write_definition(
    f: &mut fmt::Formatter<'_>,
    definition: &FunctionDefinition,
    level: usize,
) -> fmt::Result {
    pad(f, level)?;
    writeln!(f, "FunDef:")?;
    pad(f, level + 1)?;
    writeln!(f, "Id: {}", definition.identifier)?;
    if !definition.parameters.is_empty() {
        pad(f, level + 1)?;
        writeln!(f, "Parameters:")?;
        for (i, name) in definition.parameters.iter().enumerate() {
            pad(f, level + 2)?;
            writeln!(f, "[{}] {}", i, name)?;
        }
    }
    pad(f, level + 1)?;
    writeln!(f, "Body:")?;
    write_expression(f, &definition.body, level + 2)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program:")?;
        if !self.statements.is_empty() {
            pad(f, 1)?;
            writeln!(f, "Statements:")?;
            for (i, definition) in self.definitions().enumerate() {
                pad(f, 2)?;
                writeln!(f, "[{}]", i)?;
                write_definition(f, definition, 3)?;
            }
        }
        pad(f, 1)?;
        writeln!(f, "Expression:")?;
        write_expression(f, &self.root, 2)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expression(f, self, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ungrouped_strips_nested_parentheses() {
        let inner = Expression::binary(
            BinaryOperator::Add,
            Expression::number("1"),
            Expression::number("2"),
        );
        let grouped = Expression::Grouped(Box::new(Expression::Grouped(Box::new(inner.clone()))));
        assert_eq!(grouped.ungrouped(), &inner);
        assert_eq!(grouped.describe(), "binary operation");
    }

    #[test]
    fn test_operator_kinds() {
        assert_eq!(BinaryOperator::Add.kind(), BinaryKind::Term);
        assert_eq!(BinaryOperator::Divide.kind(), BinaryKind::Factor);
        assert_eq!(BinaryOperator::from_symbol("*"), Some(BinaryOperator::Multiply));
        assert_eq!(BinaryOperator::from_symbol("%"), None);
    }

    #[test]
    fn test_printer_layout() {
        let program = Program::new(
            vec![],
            FunctionCall::new("sphere")
                .with_arg("radius", Expression::number("1.0"))
                .with_arg("position", Expression::tuple(["0", "0", "0"]))
                .into(),
        );
        let printed = program.to_string();
        let expected = "\
Program:
  Expression:
    FunCall: sphere
      Arguments:
        position:
          Tuple:
            [0] 0
            [1] 0
            [2] 0
        radius:
          Number: 1.0
";
        assert_eq!(printed, expected);
    }
}
