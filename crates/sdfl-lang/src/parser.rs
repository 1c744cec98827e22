//! Recursive-descent parser
//!
//! Errors do not stop the parse. Every mismatch is reported to the context's
//! diagnostics, a sticky error flag is set and parsing carries on, so callers
//! must check [`Parser::has_error`] (or use [`parse_program`]) before trusting
//! the AST.
//!
//! Grammar:
//!
//! ```text
//! program    := statement* expression EOF
//! statement  := "def" ID "(" (ID ("," ID)*)? ")" "{" expression "}"
//!             | "let" ID "=" expression            (rejected)
//! expression := term
//! term       := factor (("+" | "-") factor)*
//! factor     := primary (("*" | "/") primary)*
//! primary    := NUMBER
//!             | ID "(" (ID ":" expression ("," ID ":" expression)*)? ")"
//!             | "[" (expression ("," expression)*)? "]"
//!             | "(" NUMBER ("," NUMBER)* ","? ")"   (tuple: comma at this depth)
//!             | "(" expression ")"
//! ```

use std::collections::BTreeMap;

use crate::ast::{
    BinaryKind, BinaryOperator, Expression, FunctionCall, FunctionDefinition, Program, Statement,
};
use crate::context::CompilationContext;
use crate::diagnostics::{Location, Phase};
use crate::error::{Error, Result};
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

/// Maximum number of tuple components
const MAX_TUPLE_ARITY: usize = 3;

/// Deepest expression nesting the parser descends into
pub const MAX_NESTING: usize = 128;

pub struct Parser<'t, 'c> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    had_error: bool,
    ctx: &'c mut CompilationContext,
}

impl<'t, 'c> Parser<'t, 'c> {
    pub fn new(tokens: &'t [Token], ctx: &'c mut CompilationContext) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            had_error: false,
            ctx,
        }
    }

    /// Whether any syntax error has been reported so far
    pub fn has_error(&self) -> bool {
        self.had_error
    }

    /// Parse a whole program: definitions, one root expression, then EOF
    pub fn parse(&mut self) -> Program {
        let mut statements = Vec::new();
        while matches!(self.kind(), TokenKind::Def | TokenKind::Let) {
            let start = self.pos;
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.ensure_progress(start);
        }

        let root = self.parse_expression();
        self.eat(TokenKind::Eof);

        if self.had_error {
            tracing::debug!("Parse finished with errors");
        } else {
            tracing::debug!("Parsed {} definition(s) and a root expression", statements.len());
        }

        Program { statements, root }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn kind(&self) -> TokenKind {
        self.kind_at(0)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn location(&self) -> Location {
        self.current()
            .or_else(|| self.tokens.last())
            .map_or(Location::Unknown, |t| Location::Position {
                row: t.row,
                col: t.col,
            })
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume a token of the expected kind, or report a mismatch without
    /// consuming anything
    fn eat(&mut self, expected: TokenKind) -> Option<&'t Token> {
        if self.check(expected) {
            self.advance()
        } else {
            let found = self.kind();
            self.report(format!("expected {} but got {}", expected, found));
            None
        }
    }

    fn report(&mut self, message: String) {
        self.had_error = true;
        let location = self.location();
        self.ctx.diagnostics.error(Phase::Syntax, location, message);
    }

    /// Skip the expression at the current token: a call name and any
    /// balanced bracket group that follows it
    fn skip_nested(&mut self) {
        if self.check(TokenKind::Identifier) {
            self.advance();
        }
        let mut depth = 0usize;
        while !self.at_end() {
            match self.kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    /// Skip one token when a loop iteration consumed nothing
    fn ensure_progress(&mut self, start: usize) {
        if self.pos == start && !self.at_end() {
            self.pos += 1;
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.kind() {
            TokenKind::Def => Some(Statement::FunctionDefinition(
                self.parse_function_definition(),
            )),
            TokenKind::Let => {
                self.parse_let();
                None
            }
            _ => None,
        }
    }

    /// `def name(a, b) { body }`. The definition is registered in the symbol
    /// table before returning.
    fn parse_function_definition(&mut self) -> FunctionDefinition {
        self.eat(TokenKind::Def);
        let identifier = self
            .eat(TokenKind::Identifier)
            .map(|t| t.text.clone())
            .unwrap_or_default();

        self.eat(TokenKind::LParen);
        let mut parameters = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let start = self.pos;
            if let Some(token) = self.eat(TokenKind::Identifier) {
                parameters.push(token.text.clone());
            }
            if !self.check(TokenKind::RParen) {
                self.eat(TokenKind::Comma);
            }
            self.ensure_progress(start);
        }
        self.eat(TokenKind::RParen);

        self.eat(TokenKind::LBrace);
        let body = self.parse_expression();
        self.eat(TokenKind::RBrace);

        let definition = FunctionDefinition {
            identifier,
            parameters,
            body,
        };
        if !definition.identifier.is_empty() {
            self.ctx.register_definition(&definition);
        }
        definition
    }

    /// `let name = expr` is parsed so the rest of the file can be checked,
    /// then rejected.
    fn parse_let(&mut self) {
        let location = self.location();
        self.eat(TokenKind::Let);
        let name = self
            .eat(TokenKind::Identifier)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.eat(TokenKind::Equal);
        self.parse_expression();

        self.had_error = true;
        self.ctx.diagnostics.error(
            Phase::Syntax,
            location,
            format!(
                "variable binding `{}` is not supported; wrap reusable geometry in a `def` function",
                name
            ),
        );
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn parse_expression(&mut self) -> Expression {
        if self.depth >= MAX_NESTING {
            self.report(format!(
                "expression nested more than {} levels deep",
                MAX_NESTING
            ));
            self.skip_nested();
            return Expression::Invalid;
        }
        self.depth += 1;
        let expression = self.parse_term();
        self.depth -= 1;
        expression
    }

    fn binary_operator(&self, kind: BinaryKind) -> Option<BinaryOperator> {
        let operator = match self.kind() {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Subtract,
            TokenKind::Star => BinaryOperator::Multiply,
            TokenKind::Slash => BinaryOperator::Divide,
            _ => return None,
        };
        (operator.kind() == kind).then_some(operator)
    }

    fn parse_term(&mut self) -> Expression {
        let mut left = self.parse_factor();
        while let Some(operator) = self.binary_operator(BinaryKind::Term) {
            self.advance();
            let right = self.parse_factor();
            left = Expression::binary(operator, left, right);
        }
        left
    }

    fn parse_factor(&mut self) -> Expression {
        let mut left = self.parse_primary();
        while let Some(operator) = self.binary_operator(BinaryKind::Factor) {
            self.advance();
            let right = self.parse_primary();
            left = Expression::binary(operator, left, right);
        }
        left
    }

    fn parse_primary(&mut self) -> Expression {
        match self.kind() {
            TokenKind::Float | TokenKind::Int => self
                .advance()
                .map_or(Expression::Invalid, |t| Expression::Number(t.text.clone())),
            TokenKind::Identifier if self.kind_at(1) == TokenKind::LParen => {
                Expression::Call(self.parse_call())
            }
            TokenKind::Identifier => {
                let name = self.current().map(|t| t.text.clone()).unwrap_or_default();
                self.report(format!(
                    "`{}` is not a call; variables cannot be referenced",
                    name
                ));
                self.advance();
                Expression::Invalid
            }
            TokenKind::LBracket => Expression::Array(self.parse_array()),
            TokenKind::LParen => {
                if self.is_tuple() {
                    Expression::Tuple(self.parse_tuple())
                } else {
                    self.eat(TokenKind::LParen);
                    let inner = self.parse_expression();
                    self.eat(TokenKind::RParen);
                    match inner {
                        Expression::Array(_) => inner,
                        other => Expression::Grouped(Box::new(other)),
                    }
                }
            }
            found => {
                self.report(format!("expected an expression but got {}", found));
                Expression::Invalid
            }
        }
    }

    fn parse_call(&mut self) -> FunctionCall {
        let identifier = self
            .eat(TokenKind::Identifier)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.eat(TokenKind::LParen);

        let mut arguments = BTreeMap::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let start = self.pos;
            let name_token = self.eat(TokenKind::Identifier);
            self.eat(TokenKind::Colon);
            let value = self.parse_expression();

            if let Some(token) = name_token {
                if arguments.insert(token.text.clone(), value).is_some() {
                    self.ctx.diagnostics.warning(
                        Phase::Syntax,
                        Location::Position {
                            row: token.row,
                            col: token.col,
                        },
                        format!(
                            "argument `{}` given more than once in call to `{}`; the last value wins",
                            token.text, identifier
                        ),
                    );
                }
            }

            if !self.check(TokenKind::RParen) {
                self.eat(TokenKind::Comma);
            }
            self.ensure_progress(start);
        }
        self.eat(TokenKind::RParen);

        FunctionCall {
            identifier,
            arguments,
        }
    }

    fn parse_array(&mut self) -> Vec<Expression> {
        self.eat(TokenKind::LBracket);
        let mut items = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.at_end() {
            let start = self.pos;
            items.push(self.parse_expression());
            if !self.check(TokenKind::RBracket) {
                self.eat(TokenKind::Comma);
            }
            self.ensure_progress(start);
        }
        self.eat(TokenKind::RBracket);
        items
    }

    /// Look ahead from an opening parenthesis for a comma at the same
    /// nesting depth before the matching close.
    fn is_tuple(&self) -> bool {
        let mut depth = 0usize;
        for token in self.tokens.iter().skip(self.pos + 1) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                TokenKind::Comma if depth == 0 => return true,
                TokenKind::Eof => return false,
                _ => {}
            }
        }
        false
    }

    /// Tuples hold number literals only
    fn parse_tuple(&mut self) -> Vec<String> {
        let location = self.location();
        self.eat(TokenKind::LParen);

        let mut values = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let start = self.pos;
            match self.kind() {
                TokenKind::Float | TokenKind::Int => {
                    if let Some(token) = self.advance() {
                        values.push(token.text.clone());
                    }
                }
                found => {
                    self.report(format!(
                        "tuple components must be number literals, found {}",
                        found
                    ));
                    self.advance();
                }
            }
            if !self.check(TokenKind::RParen) {
                self.eat(TokenKind::Comma);
            }
            self.ensure_progress(start);
        }
        self.eat(TokenKind::RParen);

        if values.len() > MAX_TUPLE_ARITY {
            self.had_error = true;
            self.ctx.diagnostics.error(
                Phase::Syntax,
                location,
                format!(
                    "tuple has {} components; at most {} are allowed",
                    values.len(),
                    MAX_TUPLE_ARITY
                ),
            );
        }
        values
    }
}

/// Parse tokens and fail if any syntax error was reported
pub fn parse_program(tokens: &[Token], ctx: &mut CompilationContext) -> Result<Program> {
    let mut parser = Parser::new(tokens, ctx);
    let program = parser.parse();
    if parser.has_error() {
        return Err(Error::Syntax(ctx.diagnostics.errors_in(Phase::Syntax)));
    }
    Ok(program)
}

/// Tokenize and parse source text
pub fn parse_source(source: &str, ctx: &mut CompilationContext) -> Result<Program> {
    let tokens = tokenize(source, &mut ctx.diagnostics);
    parse_program(&tokens, ctx)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::symbols::SymbolRole;

    fn parse_root(source: &str) -> (Expression, CompilationContext) {
        let mut ctx = CompilationContext::new();
        let program = parse_source(source, &mut ctx).unwrap();
        (program.root, ctx)
    }

    fn parse_with_errors(source: &str) -> (Program, CompilationContext, bool) {
        let mut ctx = CompilationContext::new();
        let tokens = tokenize(source, &mut ctx.diagnostics);
        let mut parser = Parser::new(&tokens, &mut ctx);
        let program = parser.parse();
        let had_error = parser.has_error();
        (program, ctx, had_error)
    }

    #[test]
    fn test_tuple_with_commas() {
        let (root, _) = parse_root("(1, 2, 3)");
        assert_eq!(root, Expression::tuple(["1", "2", "3"]));
    }

    #[test]
    fn test_parenthesized_binary_is_not_a_tuple() {
        let (root, _) = parse_root("(1 + 2)");
        let expected = Expression::Grouped(Box::new(Expression::binary(
            BinaryOperator::Add,
            Expression::number("1"),
            Expression::number("2"),
        )));
        assert_eq!(root, expected);
    }

    #[test]
    fn test_single_component_tuple_needs_trailing_comma() {
        let (root, _) = parse_root("(4,)");
        assert_eq!(root, Expression::tuple(["4"]));
    }

    #[test]
    fn test_parenthesized_array_is_not_grouped() {
        let (root, _) = parse_root("([1, 2])");
        assert_eq!(
            root,
            Expression::Array(vec![Expression::number("1"), Expression::number("2")])
        );
    }

    #[test]
    fn test_precedence_and_associativity() {
        let (root, _) = parse_root("1 - 2 - 3 * 4 / 5");
        // ((1 - 2) - ((3 * 4) / 5))
        let product = Expression::binary(
            BinaryOperator::Multiply,
            Expression::number("3"),
            Expression::number("4"),
        );
        let quotient = Expression::binary(BinaryOperator::Divide, product, Expression::number("5"));
        let first = Expression::binary(
            BinaryOperator::Subtract,
            Expression::number("1"),
            Expression::number("2"),
        );
        assert_eq!(
            root,
            Expression::binary(BinaryOperator::Subtract, first, quotient)
        );
    }

    #[test]
    fn test_named_arguments() {
        let (root, _) = parse_root("sphere(position: (0, 1, 0), radius: 0.5)");
        let call = root.as_call().unwrap();
        assert_eq!(call.identifier, "sphere");
        assert_eq!(
            call.argument("position"),
            Some(&Expression::tuple(["0", "1", "0"]))
        );
        assert_eq!(call.argument("radius"), Some(&Expression::number("0.5")));
    }

    #[test]
    fn test_function_definition_is_registered() {
        let source = "
            def pillar(height) {
                local(children: [box(position: (0, 1, 0), size: (0.2, 1, 0.2))])
            }
            scene(camera: camera(position: (0, 1, 5)), children: [pillar(height: 2)])
        ";
        let mut ctx = CompilationContext::new();
        let program = parse_source(source, &mut ctx).unwrap();
        assert_eq!(program.statements.len(), 1);

        let signature = ctx.symbols.lookup("pillar").unwrap();
        assert_eq!(signature.role, SymbolRole::UserDefined);
        assert_eq!(signature.parameters, vec!["height"]);
        assert!(signature.body.is_some());
    }

    #[test]
    fn test_mismatch_is_reported_with_position() {
        let (_, ctx, had_error) = parse_with_errors("sphere(radius 1.0)");
        assert!(had_error);
        let first = ctx.diagnostics.errors_in(Phase::Syntax).remove(0);
        assert_eq!(first.location, Location::Position { row: 1, col: 15 });
        assert!(first.message.contains("expected ':'"));
    }

    #[test]
    fn test_recovery_terminates_on_truncated_input() {
        for source in ["sphere(", "scene(children: [", "(1, 2", "def f(", "box(: )", "[,,]"] {
            let (_, _, had_error) = parse_with_errors(source);
            assert!(had_error, "expected an error for {:?}", source);
        }
    }

    #[test]
    fn test_deep_nesting_is_reported_once() {
        let source = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let (program, ctx, had_error) = parse_with_errors(&source);
        assert!(had_error);
        let errors = ctx.diagnostics.errors_in(Phase::Syntax);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("nested"));

        let mut innermost = &program.root;
        let mut levels = 0;
        while let Expression::Grouped(inner) = innermost {
            innermost = inner.as_ref();
            levels += 1;
        }
        assert_eq!(levels, MAX_NESTING);
        assert_eq!(innermost, &Expression::Invalid);

        let calls = format!("{}{}", "local(children: [".repeat(5_000), "])".repeat(5_000));
        let (_, _, had_error) = parse_with_errors(&calls);
        assert!(had_error);
    }

    #[test]
    fn test_let_is_rejected() {
        let (program, ctx, had_error) = parse_with_errors("let r = 1.0\nsphere(radius: 1.0)");
        assert!(had_error);
        assert!(program.statements.is_empty());
        assert!(program.root.as_call().is_some());
        assert!(
            ctx.diagnostics
                .iter()
                .any(|d| d.message.contains("variable binding `r`"))
        );
    }

    #[test]
    fn test_tuple_limits() {
        let (_, _, had_error) = parse_with_errors("(1, 2, 3, 4)");
        assert!(had_error);
        let (_, _, had_error) = parse_with_errors("(1, sphere(), 3)");
        assert!(had_error);
    }

    #[test]
    fn test_trailing_tokens_are_an_error() {
        let (_, _, had_error) = parse_with_errors("sphere() box()");
        assert!(had_error);
    }

    #[test]
    fn test_duplicate_argument_warns_and_keeps_last() {
        let (program, ctx, had_error) = parse_with_errors("sphere(radius: 1, radius: 2)");
        assert!(!had_error);
        let call = program.root.as_call().unwrap();
        assert_eq!(call.argument("radius"), Some(&Expression::number("2")));
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn test_parse_program_returns_syntax_error() {
        let mut ctx = CompilationContext::new();
        let err = parse_source("sphere(radius: )", &mut ctx).unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
    }
}
