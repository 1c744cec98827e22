//! SDFL language front end
//!
//! Turns SDFL source text into an AST and keeps the per-compilation state
//! (symbol table, diagnostics, fresh-name counters) that later stages share.
//!
//! ## Key Types
//!
//! - [`Lexer`] - Ordered, first-match regex lexer
//! - [`Parser`] - Recursive-descent parser with error recovery
//! - [`Program`] / [`Expression`] - The AST
//! - [`CompilationContext`] - Symbols and diagnostics for one compile
//!
//! ## Example
//!
//! ```rust
//! use sdfl_lang::{CompilationContext, parse_source};
//!
//! let mut ctx = CompilationContext::new();
//! let program = parse_source(
//!     "scene(camera: camera(position: (0, 1, 5)), children: [sphere(position: (0, 0, 0), radius: 1)])",
//!     &mut ctx,
//! )
//! .unwrap();
//! assert_eq!(program.root.as_call().unwrap().identifier, "scene");
//! ```

pub mod ast;
mod context;
mod diagnostics;
mod error;
mod lexer;
mod parser;
mod symbols;
mod token;

pub use ast::{
    BinaryKind, BinaryOperation, BinaryOperator, Expression, FunctionCall, FunctionDefinition,
    Program, Statement,
};
pub use context::{CompilationContext, FreshNames};
pub use diagnostics::{Diagnostic, Diagnostics, Location, Phase, Severity};
pub use error::{Error, Result};
pub use lexer::{Lexer, Rule, is_identifier, is_number_literal, tokenize};
pub use parser::{MAX_NESTING, Parser, parse_program, parse_source};
pub use symbols::{FunctionSignature, SymbolRole, SymbolTable};
pub use token::{Token, TokenKind};
