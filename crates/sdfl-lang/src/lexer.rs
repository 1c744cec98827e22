//! Rule-driven lexer
//!
//! The lexer tries its rules in declaration order at the current scan
//! position and the first rule whose pattern matches there wins. This is not
//! longest-match: keyword rules must come before the identifier rule and the
//! comment rule must come before `/`.

use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostics::{Diagnostics, Location, Phase};
use crate::token::{Token, TokenKind};

const IDENTIFIER_PATTERN: &str = r"[a-zA-Z_][a-zA-Z_0-9]*";
const FLOAT_PATTERN: &str = r"[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?[fF]?";

/// Default rule table: `(kind, pattern, skippable)`
const DEFAULT_RULES: &[(TokenKind, &str, bool)] = &[
    (TokenKind::Def, r"def\b", false),
    (TokenKind::Let, r"let\b", false),
    (TokenKind::Identifier, IDENTIFIER_PATTERN, false),
    (TokenKind::Float, FLOAT_PATTERN, false),
    (TokenKind::Int, r"[+-]?(?:0[xX][0-9A-Fa-f]+|\d+)[uU]?", false),
    (TokenKind::Comment, r"//[^\n]*", true),
    (TokenKind::Star, r"\*", false),
    (TokenKind::Slash, r"/", false),
    (TokenKind::Plus, r"\+", false),
    (TokenKind::Minus, r"-", false),
    (TokenKind::Equal, r"=", false),
    (TokenKind::LParen, r"\(", false),
    (TokenKind::RParen, r"\)", false),
    (TokenKind::LBracket, r"\[", false),
    (TokenKind::RBracket, r"\]", false),
    (TokenKind::LBrace, r"\{", false),
    (TokenKind::RBrace, r"\}", false),
    (TokenKind::Colon, r":", false),
    (TokenKind::Comma, r",", false),
    (TokenKind::Whitespace, r"[ \t\r\n]", true),
];

/// One lexer rule. The pattern is anchored at the scan position.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: TokenKind,
    pattern: Regex,
    skippable: bool,
}

impl Rule {
    pub fn new(kind: TokenKind, pattern: &str, skippable: bool) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self {
            kind,
            pattern,
            skippable,
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn is_skippable(&self) -> bool {
        self.skippable
    }

    /// Length in bytes of a non-empty match at the start of `input`
    fn match_len(&self, input: &str) -> Option<usize> {
        self.pattern
            .find(input)
            .map(|m| m.end())
            .filter(|&len| len > 0)
    }
}

/// Ordered, first-match lexer
#[derive(Debug, Clone)]
pub struct Lexer {
    rules: Vec<Rule>,
}

impl Lexer {
    /// Create a lexer with the SDFL rule table
    pub fn new() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|&(kind, pattern, skippable)| {
                match Rule::new(kind, pattern, skippable) {
                    Ok(rule) => Some(rule),
                    Err(e) => {
                        tracing::error!("Invalid lexer rule for {}: {}", kind, e);
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// Create a lexer with a caller-defined rule order
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Convert source text into tokens, always ending with one EOF token.
    ///
    /// Unrecognized characters are reported to `diagnostics` and skipped.
    pub fn tokenize(&self, source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut row = 1;
        let mut col = 1;

        while pos < source.len() {
            let rest = &source[pos..];
            if rest.starts_with('\n') {
                row += 1;
                col = 0;
            }

            let matched = self
                .rules
                .iter()
                .find_map(|rule| rule.match_len(rest).map(|len| (rule, len)));

            match matched {
                Some((rule, len)) => {
                    if !rule.skippable {
                        tokens.push(Token::new(rule.kind, &rest[..len], row, col));
                    }
                    pos += len;
                    col += len;
                }
                None => {
                    let ch = rest.chars().next().unwrap_or('\u{FFFD}');
                    diagnostics.error(
                        Phase::Lexical,
                        Location::Position { row, col },
                        format!("unrecognized character {:?}", ch),
                    );
                    pos += ch.len_utf8();
                    col += 1;
                }
            }
        }

        tokens.push(Token::eof(row, col));
        tracing::debug!("Lexed {} tokens", tokens.len());
        tokens
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize with the default rule table
pub fn tokenize(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    Lexer::new().tokenize(source, diagnostics)
}

static IDENTIFIER: OnceLock<Option<Regex>> = OnceLock::new();
static FLOAT: OnceLock<Option<Regex>> = OnceLock::new();

fn whole_match(cell: &OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(&format!("^(?:{})$", pattern)).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Whether `text` is exactly one identifier token
pub fn is_identifier(text: &str) -> bool {
    whole_match(&IDENTIFIER, IDENTIFIER_PATTERN, text)
}

/// Whether `text` is exactly one number literal token
pub fn is_number_literal(text: &str) -> bool {
    whole_match(&FLOAT, FLOAT_PATTERN, text)
}
