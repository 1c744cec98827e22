//! Source and sequence compilation
//!
//! Every compile gets its own [`CompilationContext`], so compiling twice in
//! one process never leaks user functions or diagnostics between runs.

use std::path::Path;

use sdfl_glsl::{GeneratedShaders, GeneratorOptions, GlslGenerator};
use sdfl_lang::{CompilationContext, Diagnostic, Program, Token};

use crate::error::{CompileError, Result};
use crate::output::OutputPaths;

/// What kind of text a compile input holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// SDFL source code
    #[default]
    Source,
    /// Line-oriented instruction sequence
    Sequence,
}

impl InputKind {
    pub fn from_flag(sequence: bool) -> Self {
        if sequence {
            InputKind::Sequence
        } else {
            InputKind::Source
        }
    }
}

/// Everything one compile produced
#[derive(Debug, Clone)]
pub struct Compilation {
    pub kind: InputKind,
    /// Tokens of a source input; empty for sequence input
    pub tokens: Vec<Token>,
    pub program: Program,
    /// Canonical sequence lines of `program`
    pub sequence: Vec<String>,
    pub shaders: GeneratedShaders,
    /// Warnings and non-fatal errors, in report order
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn sequence_text(&self) -> String {
        self.sequence.join("\n")
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Compiles SDFL source or sequences into shaders
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: GeneratorOptions,
}

impl Compiler {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn compile(&self, text: &str, kind: InputKind) -> Result<Compilation> {
        match kind {
            InputKind::Source => self.compile_source(text),
            InputKind::Sequence => self.compile_sequence(text),
        }
    }

    /// Lex, parse and generate. Syntax errors are fatal; skipped characters
    /// only show up in the diagnostics.
    pub fn compile_source(&self, source: &str) -> Result<Compilation> {
        let mut ctx = CompilationContext::new();

        let tokens = sdfl_lang::tokenize(source, &mut ctx.diagnostics);
        tracing::debug!("Lexed {} tokens", tokens.len());

        let program = sdfl_lang::parse_program(&tokens, &mut ctx)?;
        tracing::debug!("Parsed program:\n{}", program);

        self.finish(InputKind::Source, tokens, program, ctx)
    }

    /// Decode a sequence and generate from it
    pub fn compile_sequence(&self, text: &str) -> Result<Compilation> {
        let mut ctx = CompilationContext::new();
        let program = sdfl_seq::decode_str(text, &mut ctx)?;
        tracing::debug!("Decoded program:\n{}", program);

        self.finish(InputKind::Sequence, Vec::new(), program, ctx)
    }

    pub fn compile_file(&self, path: impl AsRef<Path>, kind: InputKind) -> Result<Compilation> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Compiling {} ({:?})", path.display(), kind);
        self.compile(&text, kind)
    }

    /// Compile a file and write its outputs. The sequence file is only
    /// written for source input.
    pub fn build(
        &self,
        path: impl AsRef<Path>,
        kind: InputKind,
        outputs: &OutputPaths,
    ) -> Result<Compilation> {
        let compilation = self.compile_file(path, kind)?;
        outputs.write_shaders(&compilation.shaders)?;
        if kind == InputKind::Source {
            outputs.write_sequence(&compilation.sequence)?;
        }
        Ok(compilation)
    }

    fn finish(
        &self,
        kind: InputKind,
        tokens: Vec<Token>,
        program: Program,
        mut ctx: CompilationContext,
    ) -> Result<Compilation> {
        let sequence = sdfl_seq::encode_lines(&program)?;

        let mut generator = GlslGenerator::new(self.options.clone());
        let shaders = generator.generate(&program, &mut ctx)?;

        let compilation = Compilation {
            kind,
            tokens,
            program,
            sequence,
            shaders,
            diagnostics: ctx.diagnostics.into_vec(),
        };
        tracing::info!(
            "Compiled {} instructions ({} error(s), {} warning(s))",
            compilation.sequence.len(),
            compilation.error_count(),
            compilation.warning_count()
        );
        Ok(compilation)
    }
}
